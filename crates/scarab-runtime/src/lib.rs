//! Page orchestration: the controller, its scheduled tasks, and the view
//! seam.

mod controller;
mod gate;
mod view;

pub use controller::{PageCatalog, PageController};
pub use gate::DwellGate;
pub use view::{CartControlState, PageView};
