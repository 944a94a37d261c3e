use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::renderer::{BatchMode, MAX_LIGHTS};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderSettings {
    #[serde(default)]
    pub resolution: Resolution,
    #[serde(default)]
    pub present_mode: PresentModeSetting,
    #[serde(default)]
    pub batch_mode: BatchMode,
    #[serde(default = "RenderSettings::default_light_count")]
    pub light_count: usize,
    #[serde(default)]
    pub light_seed: Option<u64>,
    #[serde(default)]
    pub grid: GridSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            resolution: Resolution::default(),
            present_mode: PresentModeSetting::default(),
            batch_mode: BatchMode::default(),
            light_count: Self::default_light_count(),
            light_seed: None,
            grid: GridSettings::default(),
        }
    }
}

impl RenderSettings {
    pub fn load() -> Self {
        Self::load_from_path("settings.json")
    }

    pub fn load_from_path<P: AsRef<std::path::Path>>(path: P) -> Self {
        use std::fs;

        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str::<RenderSettings>(&contents) {
                Ok(settings) => {
                    info!("Loaded render settings from {:?}", path);
                    settings.validate()
                }
                Err(err) => {
                    warn!(
                        "Failed to parse {:?} ({}). Falling back to default render settings.",
                        path, err
                    );
                    RenderSettings::default()
                }
            },
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                info!(
                    "Render settings file {:?} not found. Using default settings.",
                    path
                );
                RenderSettings::default()
            }
            Err(err) => {
                warn!(
                    "Failed to read {:?} ({}). Falling back to default render settings.",
                    path, err
                );
                RenderSettings::default()
            }
        }
    }

    fn validate(mut self) -> Self {
        if self.resolution.width == 0 || self.resolution.height == 0 {
            warn!("Resolution must be greater than zero. Using default resolution.");
            self.resolution = Resolution::default();
        }

        if self.light_count > MAX_LIGHTS {
            warn!(
                "Light count {} exceeds the light buffer capacity. Clamping to {}.",
                self.light_count, MAX_LIGHTS
            );
            self.light_count = MAX_LIGHTS;
        }

        if !self.grid.spread.is_finite() || self.grid.spread <= 0.0 {
            warn!("Grid spread must be a positive number. Using default spread.");
            self.grid.spread = GridSettings::default().spread;
        }

        self
    }

    pub fn present_mode(&self, available: &[wgpu::PresentMode]) -> wgpu::PresentMode {
        let desired = self.present_mode.to_wgpu();
        // Auto modes are resolved by wgpu itself and never listed as capabilities.
        let is_auto = matches!(
            desired,
            wgpu::PresentMode::AutoVsync | wgpu::PresentMode::AutoNoVsync
        );
        if is_auto || available.contains(&desired) {
            return desired;
        }

        warn!(
            "Requested present mode {:?} is not supported. Falling back to FIFO.",
            desired
        );

        if available.contains(&wgpu::PresentMode::Fifo) {
            wgpu::PresentMode::Fifo
        } else {
            available
                .first()
                .copied()
                .unwrap_or(wgpu::PresentMode::Fifo)
        }
    }

    const fn default_light_count() -> usize {
        MAX_LIGHTS
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Default for Resolution {
    fn default() -> Self {
        Self {
            width: 1400,
            height: 900,
        }
    }
}

/// Dimensions of the demo object grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GridSettings {
    pub x: u32,
    pub y: u32,
    pub z: u32,
    pub spread: f32,
}

impl Default for GridSettings {
    fn default() -> Self {
        Self {
            x: 50,
            y: 50,
            z: 50,
            spread: 2.0,
        }
    }
}

impl GridSettings {
    pub fn object_count(&self) -> usize {
        self.x as usize * self.y as usize * self.z as usize
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PresentModeSetting {
    Fifo,
    FifoRelaxed,
    Immediate,
    Mailbox,
    AutoVsync,
    AutoNoVsync,
}

impl PresentModeSetting {
    fn to_wgpu(&self) -> wgpu::PresentMode {
        match self {
            PresentModeSetting::Fifo => wgpu::PresentMode::Fifo,
            PresentModeSetting::FifoRelaxed => wgpu::PresentMode::FifoRelaxed,
            PresentModeSetting::Immediate => wgpu::PresentMode::Immediate,
            PresentModeSetting::Mailbox => wgpu::PresentMode::Mailbox,
            PresentModeSetting::AutoVsync => wgpu::PresentMode::AutoVsync,
            PresentModeSetting::AutoNoVsync => wgpu::PresentMode::AutoNoVsync,
        }
    }
}

impl Default for PresentModeSetting {
    fn default() -> Self {
        PresentModeSetting::Immediate
    }
}
