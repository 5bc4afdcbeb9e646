pub mod app;
pub mod camera;
pub mod collectible;
pub mod geometry;
pub mod level;
pub mod particles;
pub mod scene;

pub use app::App;
pub use camera::Camera;
pub use collectible::{Egg, EggField};
pub use level::Level;
