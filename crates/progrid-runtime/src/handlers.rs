#![forbid(unsafe_code)]

//! Caller-supplied hooks.

use std::fmt;

use progrid_core::{ClickEvent, FetchError, ResolvedMedia, RowTicket};

/// Token handed to `on_error`; pass it to `ProgressiveGrid::retry` to
/// re-issue the failed fetch.
///
/// A retry is honoured only while the row is still on surface with the
/// same generation; otherwise it is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Retry {
    ticket: RowTicket,
}

impl Retry {
    pub(crate) const fn new(ticket: RowTicket) -> Self {
        Self { ticket }
    }

    /// Ticket of the failed fetch.
    #[must_use]
    pub const fn ticket(&self) -> RowTicket {
        self.ticket
    }
}

type Resolver = Box<dyn Fn(&str) -> String>;
type ClickHook = Box<dyn FnMut(&ClickEvent, &ResolvedMedia, &str)>;
type ErrorHook = Box<dyn FnMut(&FetchError, Retry)>;
type GroupHook = Box<dyn FnMut(Option<&str>)>;

/// Hooks invoked by the engine. Every hook is optional; the URL resolver
/// defaults to the identity.
pub struct GridHandlers {
    resolve_media_url: Resolver,
    on_click: Option<ClickHook>,
    on_error: Option<ErrorHook>,
    on_active_group: Option<GroupHook>,
}

impl fmt::Debug for GridHandlers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GridHandlers")
            .field("on_click", &self.on_click.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("on_active_group", &self.on_active_group.is_some())
            .finish_non_exhaustive()
    }
}

impl Default for GridHandlers {
    fn default() -> Self {
        Self {
            resolve_media_url: Box::new(str::to_string),
            on_click: None,
            on_error: None,
            on_active_group: None,
        }
    }
}

impl GridHandlers {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Map a media reference to the URL the transport fetches.
    #[must_use]
    pub fn with_url_resolver<F>(mut self, resolve: F) -> Self
    where
        F: Fn(&str) -> String + 'static,
    {
        self.resolve_media_url = Box::new(resolve);
        self
    }

    /// Called with the resolved media and group key of a clicked, loaded row.
    #[must_use]
    pub fn on_click<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&ClickEvent, &ResolvedMedia, &str) + 'static,
    {
        self.on_click = Some(Box::new(hook));
        self
    }

    /// Called when a fetch fails.
    #[must_use]
    pub fn on_error<F>(mut self, hook: F) -> Self
    where
        F: FnMut(&FetchError, Retry) + 'static,
    {
        self.on_error = Some(Box::new(hook));
        self
    }

    /// Called when the group under the viewport top changes, with `None`
    /// once the reported group has left the sequence and no row replaces it.
    #[must_use]
    pub fn on_active_group<F>(mut self, hook: F) -> Self
    where
        F: FnMut(Option<&str>) + 'static,
    {
        self.on_active_group = Some(Box::new(hook));
        self
    }

    pub(crate) fn resolve_url(&self, media_ref: &str) -> String {
        (self.resolve_media_url)(media_ref)
    }

    pub(crate) fn click(&mut self, event: &ClickEvent, media: &ResolvedMedia, group_key: &str) -> bool {
        match self.on_click.as_mut() {
            Some(hook) => {
                hook(event, media, group_key);
                true
            }
            None => false,
        }
    }

    pub(crate) fn error(&mut self, err: &FetchError, retry: Retry) {
        if let Some(hook) = self.on_error.as_mut() {
            hook(err, retry);
        }
    }

    pub(crate) fn active_group(&mut self, group_key: Option<&str>) {
        if let Some(hook) = self.on_active_group.as_mut() {
            hook(group_key);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn default_resolver_is_identity() {
        let h = GridHandlers::default();
        assert_eq!(h.resolve_url("clip.mp3"), "clip.mp3");
    }

    #[test]
    fn custom_resolver_and_hooks() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        let mut h = GridHandlers::new()
            .with_url_resolver(|r| format!("https://cdn.test/{r}"))
            .on_active_group(move |g| sink.borrow_mut().push(g.map(str::to_string)));
        assert_eq!(h.resolve_url("a"), "https://cdn.test/a");
        h.active_group(Some("s1"));
        h.active_group(None);
        assert_eq!(*seen.borrow(), vec![Some("s1".to_string()), None]);
        let media = ResolvedMedia {
            url: "u".into(),
            bytes: Vec::<u8>::new().into(),
        };
        assert!(!h.click(&ClickEvent::default(), &media, "s1"));
    }
}
