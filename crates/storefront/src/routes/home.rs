//! Landing page route handler.

use askama::Template;
use askama_web::WebTemplate;
use axum::response::IntoResponse;
use tracing::instrument;

use crate::filters;
use crate::middleware::OptionalAuth;

/// One card in the features section.
#[derive(Clone)]
pub struct FeatureCard {
    pub icon: &'static str,
    pub title: &'static str,
    pub body: &'static str,
}

/// Cards shown under the hero.
pub static FEATURES: [FeatureCard; 4] = [
    FeatureCard {
        icon: "🧾",
        title: "Easy Inventory",
        body: "Add, edit, and organize your products in seconds.",
    },
    FeatureCard {
        icon: "⚡",
        title: "Quick Search",
        body: "Find products instantly with powerful search and filters.",
    },
    FeatureCard {
        icon: "📊",
        title: "Price Management",
        body: "Update prices and track your product catalog effortlessly.",
    },
    FeatureCard {
        icon: "👥",
        title: "For Everyone",
        body: "Simple interface designed for all skill levels.",
    },
];

/// Landing page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub signed_in: bool,
    pub features: &'static [FeatureCard],
}

/// Display the landing page.
#[instrument(skip(user))]
pub async fn home(OptionalAuth(user): OptionalAuth) -> impl IntoResponse {
    HomeTemplate {
        signed_in: user.is_some(),
        features: &FEATURES,
    }
}
