//! The rendering seam.
//!
//! The controller never touches a rendering surface directly; it drives a
//! [`PageView`] implementation. The console front end renders to the
//! terminal, tests record calls. Styling, animation, and accessibility
//! attributes live entirely behind this trait.

use scarab_core::countdown::Urgency;
use scarab_core::message::ScarcityMessage;

/// State of the add-to-cart control as the visitor sees it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CartControlState {
    Enabled,
    /// Disabled without a conversion (timer expiry or continue enablement)
    Disabled,
    /// Disabled because the item was added ("Added to Cart")
    Converted,
}

pub trait PageView: Send + Sync + 'static {
    /// Reports the first essential affordance this surface cannot provide,
    /// if any. Page setup aborts when one is missing.
    fn missing_essential(&self) -> Option<&'static str> {
        None
    }

    fn render_scarcity(&self, message: &ScarcityMessage);

    /// Replaces the scarcity slot once the time-limited offer has expired.
    fn render_scarcity_expired(&self);

    fn render_countdown(&self, display: &str, urgency: Urgency);

    fn set_cart_state(&self, state: CartControlState);

    /// Makes the continue control visible and enabled.
    fn reveal_continue(&self);

    fn render_gallery(&self, current: usize, image_count: usize);

    /// User-visible notice (cart confirmation, fatal redirect error).
    fn notify(&self, message: &str);
}
