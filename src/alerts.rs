use async_trait::async_trait;

use crate::store::NotificationKind;

/// Icon category a platform alert renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Icon {
    Chat,
    Cart,
    Truck,
    Card,
    Star,
    Gear,
    Bell,
}

impl Icon {
    /// Stable asset reference the platform layer resolves to an image.
    pub fn asset(&self) -> &'static str {
        match self {
            Icon::Chat => "icons/chat.svg",
            Icon::Cart => "icons/cart.svg",
            Icon::Truck => "icons/truck.svg",
            Icon::Card => "icons/card.svg",
            Icon::Star => "icons/star.svg",
            Icon::Gear => "icons/gear.svg",
            Icon::Bell => "icons/bell.svg",
        }
    }
}

/// Total mapping from notification kind to icon; kinds this build does not
/// know fall back to the bell.
pub fn icon_for(kind: NotificationKind) -> Icon {
    match kind {
        NotificationKind::NewMessage => Icon::Chat,
        NotificationKind::NewOrder => Icon::Cart,
        NotificationKind::OrderStatus => Icon::Truck,
        NotificationKind::Payment => Icon::Card,
        NotificationKind::Review => Icon::Star,
        NotificationKind::System => Icon::Gear,
        NotificationKind::Unknown => Icon::Bell,
    }
}

/// Everything the platform needs to show one alert.
#[derive(Debug, Clone)]
pub struct AlertRequest {
    pub title: String,
    pub body: String,
    pub icon: Icon,
    /// Platform-side coalescing key; the notification id.
    pub tag: String,
    pub require_interaction: bool,
    pub link: Option<String>,
}

/// How an alert left the screen. `Clicked` is the only outcome the core acts
/// on; the rest are logged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AlertOutcome {
    Clicked,
    Closed,
    TimedOut,
    Error { message: String },
}

/// Platform notification surface. When no presenter is installed on the app
/// handle the core skips presentation entirely.
#[async_trait]
pub trait AlertPresenter: Send + Sync + 'static {
    /// Shows the alert and resolves once the user acts on it or the platform
    /// dismisses it. The core enforces its own timeout around this call.
    async fn present(&self, request: AlertRequest) -> AlertOutcome;
}

/// Invoked on a clicked alert that carries a deep-link. Routing is the
/// host's business; the core only hands over the link.
pub trait Navigator: Send + Sync + 'static {
    fn navigate(&self, link: &str);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_kind_maps_to_an_icon() {
        let kinds = [
            NotificationKind::NewMessage,
            NotificationKind::NewOrder,
            NotificationKind::OrderStatus,
            NotificationKind::Payment,
            NotificationKind::Review,
            NotificationKind::System,
            NotificationKind::Unknown,
        ];
        for kind in kinds {
            // Total: the asset lookup must resolve for every kind.
            assert!(!icon_for(kind).asset().is_empty());
        }
    }

    #[test]
    fn unknown_kind_falls_back_to_bell() {
        assert_eq!(icon_for(NotificationKind::Unknown), Icon::Bell);
    }

    #[test]
    fn unrecognized_wire_kind_deserializes_as_unknown() {
        let kind: NotificationKind = serde_json::from_str("\"LOYALTY_TIER\"").unwrap();
        assert_eq!(kind, NotificationKind::Unknown);
        assert_eq!(icon_for(kind), Icon::Bell);
    }
}
