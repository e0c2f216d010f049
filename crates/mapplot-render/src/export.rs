//! Writing the composite to disk and handing it to the platform viewer.

use crate::error::{RenderError, RenderResult};
use image::RgbaImage;
use std::path::{Path, PathBuf};

/// Paths without an extension get `.png`.
pub fn ensure_png_extension(path: impl Into<PathBuf>) -> PathBuf {
    let path = path.into();
    if path.extension().is_some() {
        path
    } else {
        path.with_extension("png")
    }
}

/// Encode `image` at `path` (format from the extension), returning where it went.
pub fn export_png(image: &RgbaImage, path: impl Into<PathBuf>) -> RenderResult<PathBuf> {
    let path = ensure_png_extension(path);
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    image.save(&path)?;
    tracing::info!("Exported map to {}", path.display());
    Ok(path)
}

/// Write `image` to a temporary PNG and open it in the default viewer.
pub fn open_preview(image: &RgbaImage) -> RenderResult<PathBuf> {
    let path = std::env::temp_dir().join(format!("mapplot-preview-{}.png", std::process::id()));
    let path = export_png(image, path)?;
    if !open_in_default_app(&path) {
        return Err(RenderError::Io(std::io::Error::other(format!(
            "no viewer could be launched for {}",
            path.display()
        ))));
    }
    Ok(path)
}

fn open_in_default_app(path: &Path) -> bool {
    #[cfg(target_os = "windows")]
    {
        let target = path.to_string_lossy().to_string();
        return std::process::Command::new("cmd")
            .args(["/C", "start", "", &target])
            .spawn()
            .is_ok();
    }

    #[cfg(target_os = "macos")]
    {
        return std::process::Command::new("open").arg(path).spawn().is_ok();
    }

    #[cfg(target_os = "linux")]
    {
        return std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()
            .is_ok();
    }

    #[cfg(not(any(target_os = "windows", target_os = "macos", target_os = "linux")))]
    {
        let _ = path;
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_extension_added_only_when_missing() {
        assert_eq!(ensure_png_extension("map"), PathBuf::from("map.png"));
        assert_eq!(ensure_png_extension("map.jpg"), PathBuf::from("map.jpg"));
    }

    #[test]
    fn test_export_writes_readable_png() {
        let dir = tempfile::tempdir().unwrap();
        let image = RgbaImage::from_pixel(3, 2, Rgba([9, 8, 7, 255]));
        let written = export_png(&image, dir.path().join("out").join("map")).unwrap();
        assert_eq!(written, dir.path().join("out").join("map.png"));
        let back = image::open(&written).unwrap().into_rgba8();
        assert_eq!(back.dimensions(), (3, 2));
        assert_eq!(back.get_pixel(2, 1).0, [9, 8, 7, 255]);
    }
}
