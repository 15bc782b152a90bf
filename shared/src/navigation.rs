use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Route {
    #[default]
    Home,
    Cars,
    Booking,
    Create,
}

impl Route {
    pub const DESTINATIONS: [Route; 3] = [Route::Cars, Route::Booking, Route::Create];

    pub const fn path(self) -> &'static str {
        match self {
            Route::Home => "/",
            Route::Cars => "/cars",
            Route::Booking => "/booking",
            Route::Create => "/create",
        }
    }

    /// Ignores the query string, fragment and a trailing slash.
    pub fn from_path(path: &str) -> Option<Self> {
        let path = path.split(['?', '#']).next().unwrap_or_default();
        let path = match path.trim_end_matches('/') {
            "" => "/",
            trimmed => trimmed,
        };
        match path {
            "/" => Some(Route::Home),
            "/cars" => Some(Route::Cars),
            "/booking" => Some(Route::Booking),
            "/create" => Some(Route::Create),
            _ => None,
        }
    }

    const fn header_label(self) -> &'static str {
        match self {
            Route::Home => "Главная",
            Route::Cars => "Просмотр",
            Route::Booking => "Бронирование",
            Route::Create => "Создание",
        }
    }

    const fn footer_label(self) -> &'static str {
        match self {
            Route::Home => "Главная",
            Route::Cars => "Авто",
            Route::Booking => "Бронь",
            Route::Create => "Создать",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NavItem {
    pub route: Route,
    pub path: String,
    pub label: String,
    pub selected: bool,
}

/// Segmented control at the top of every view.
pub fn header_items(current: Route) -> Vec<NavItem> {
    items(current, Route::header_label)
}

/// Tab bar pinned to the bottom of every view.
pub fn footer_items(current: Route) -> Vec<NavItem> {
    items(current, Route::footer_label)
}

fn items(current: Route, label: fn(Route) -> &'static str) -> Vec<NavItem> {
    Route::DESTINATIONS
        .iter()
        .map(|&route| NavItem {
            route,
            path: route.path().to_string(),
            label: label(route).to_string(),
            selected: route == current,
        })
        .collect()
}

/// Current route plus the back stack. A route appears in the stack at most
/// once and never while it is current, so the stack stays shorter than the
/// route list.
#[derive(Debug, Clone, Default)]
pub struct Navigator {
    current: Route,
    history: Vec<Route>,
}

impl Navigator {
    pub fn current(&self) -> Route {
        self.current
    }

    /// Returns the route left behind, or `None` when already there.
    pub fn push(&mut self, route: Route) -> Option<Route> {
        if route == self.current {
            return None;
        }
        let previous = std::mem::replace(&mut self.current, route);
        self.history.retain(|&r| r != previous && r != route);
        self.history.push(previous);
        Some(previous)
    }

    /// Pops the back stack; with no history the catalog is the landing view.
    pub fn back(&mut self) -> Option<Route> {
        let target = self.history.pop().unwrap_or(Route::Cars);
        if target == self.current {
            return None;
        }
        Some(std::mem::replace(&mut self.current, target))
    }

    pub fn can_go_back(&self) -> bool {
        !self.history.is_empty()
    }
}
