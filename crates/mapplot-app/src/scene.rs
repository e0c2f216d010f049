use mapplot_core::{Legend, MapSettings, Space};

/// What gets drawn: the selected space, the legend, and the settings.
///
/// A draw works on a snapshot; edits made afterwards apply to the next draw.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub space: Space,
    pub legend: Legend,
    pub settings: MapSettings,
}

impl Scene {
    pub fn new(space: Space) -> Self {
        Self {
            space,
            legend: Legend::new(),
            settings: MapSettings::default(),
        }
    }

    pub fn with_legend(mut self, legend: Legend) -> Self {
        self.legend = legend;
        self
    }

    pub fn with_settings(mut self, settings: MapSettings) -> Self {
        self.settings = settings;
        self
    }
}
