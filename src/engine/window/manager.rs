//! Window management implementation.

use std::sync::Arc;

use log::{error, info};
use winit::dpi::PhysicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Fullscreen, Window};

use crate::config::WindowConfig;
use crate::error::{GameError, Result};

#[derive(Default)]
pub struct WindowManager {
    window: Option<Arc<Window>>,
}

impl WindowManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create_window(&mut self, event_loop: &ActiveEventLoop, config: &WindowConfig) -> Result<Arc<Window>> {
        let mut attributes = Window::default_attributes()
            .with_title(config.title.clone())
            .with_inner_size(PhysicalSize::new(config.width, config.height));
        if config.fullscreen {
            attributes = attributes.with_fullscreen(Some(Fullscreen::Borderless(None)));
        }

        let window = event_loop.create_window(attributes).map_err(|e| {
            error!("Failed to create window: {:?}", e);
            GameError::Graphics(format!("failed to create window: {e}"))
        })?;
        let size = window.inner_size();
        info!("Created window {}x{}", size.width, size.height);

        let window = Arc::new(window);
        self.window = Some(window.clone());
        Ok(window)
    }

    pub fn request_redraw(&self) {
        if let Some(window) = &self.window {
            window.request_redraw();
        }
    }

    pub fn get_window(&self) -> Option<&Window> {
        self.window.as_deref()
    }
}
