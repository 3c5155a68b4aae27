use shared::domain::Session;
use tokio::sync::watch;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    ExternalValidator { record_id: Option<String> },
    Unauthenticated,
    AdminOverview,
    InspectionDraft,
}

/// Parsed form of a location fragment such as `#/validate?id=abc`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NavigationFragment {
    pub validate: bool,
    pub record_id: Option<String>,
}

impl NavigationFragment {
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim().trim_start_matches('#');
        let (path, query) = match raw.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (raw, None),
        };

        let mut validate = path
            .split('/')
            .any(|segment| segment.eq_ignore_ascii_case("validate"));
        let mut record_id = None;
        if let Some(query) = query {
            for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
                match key.as_ref() {
                    "validate" => validate = true,
                    "id" if !value.is_empty() => record_id = Some(value.into_owned()),
                    _ => {}
                }
            }
        }

        if !validate {
            return Self::default();
        }
        Self {
            validate,
            record_id,
        }
    }
}

/// Wakes subscribers only when the parsed fragment changes.
pub struct NavigationSignal {
    tx: watch::Sender<NavigationFragment>,
}

impl NavigationSignal {
    pub fn new(initial: &str) -> Self {
        let (tx, _) = watch::channel(NavigationFragment::parse(initial));
        Self { tx }
    }

    pub fn set_fragment(&self, raw: &str) {
        let parsed = NavigationFragment::parse(raw);
        self.tx.send_if_modified(|current| {
            if *current == parsed {
                return false;
            }
            *current = parsed;
            true
        });
    }

    pub fn subscribe(&self) -> watch::Receiver<NavigationFragment> {
        self.tx.subscribe()
    }
}

impl Default for NavigationSignal {
    fn default() -> Self {
        Self::new("")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeRouter {
    overview: bool,
}

impl Default for ModeRouter {
    fn default() -> Self {
        Self { overview: true }
    }
}

impl ModeRouter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn overview_active(&self) -> bool {
        self.overview
    }

    /// First match wins: validator link, then missing session, then the admin overview.
    pub fn select(&self, fragment: &NavigationFragment, session: Option<&Session>) -> Mode {
        if fragment.validate {
            return Mode::ExternalValidator {
                record_id: fragment.record_id.clone(),
            };
        }
        let Some(session) = session else {
            return Mode::Unauthenticated;
        };
        if session.is_elevated() && self.overview {
            return Mode::AdminOverview;
        }
        Mode::InspectionDraft
    }

    pub fn on_login(&mut self) {
        self.overview = true;
    }

    /// Back to the state of a fresh process, e.g. after logout.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn on_edit_entry(&mut self, session: Option<&Session>) {
        if session.is_some_and(Session::is_elevated) {
            self.overview = false;
        }
    }

    pub fn open_draft(&mut self) {
        self.overview = false;
    }

    pub fn return_to_overview(&mut self) {
        self.overview = true;
    }
}

#[cfg(test)]
#[path = "tests/mode_tests.rs"]
mod tests;
