//! Dynamic pad resolution.
//!
//! Demuxers and decodebins only create their source pads once they have
//! classified the input. A [`PadResolver`] is attached to such a stage's
//! `pad-added` signal and links the first matching pad to one fixed sink pad.
//!
//! The callback runs on a GStreamer streaming thread, possibly concurrently
//! with itself, so the UNLINKED -> LINKED transition is guarded by an atomic
//! compare-and-exchange on a [`LinkSlot`].

use gstreamer as gst;
use gstreamer::prelude::*;
use pipewright_types::PadMatcher;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Outcome of one `pad-added` callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// The new pad is a sink pad; nothing to do.
    NotSource,
    /// The sink slot was already filled; the new pad is left alone.
    AlreadyLinked,
    /// The pad did not satisfy the matcher.
    Ignored,
    /// The pad was linked and the slot is now filled.
    Linked,
    /// The pad matched but GStreamer refused the link; the slot stays empty.
    LinkFailed,
}

/// One-shot LINKED/UNLINKED flag for a fixed sink pad.
#[derive(Debug, Default)]
pub struct LinkSlot {
    linked: AtomicBool,
}

impl LinkSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_linked(&self) -> bool {
        self.linked.load(Ordering::Acquire)
    }

    /// Move UNLINKED -> LINKED. Returns false if another caller got there first.
    pub fn try_claim(&self) -> bool {
        self.linked
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Undo a claim after a failed link attempt.
    pub fn release(&self) {
        self.linked.store(false, Ordering::Release);
    }
}

struct ResolverInner {
    upstream: String,
    sink_pad: gst::Pad,
    sink_desc: String,
    matcher: PadMatcher,
    slot: LinkSlot,
}

/// Links the first matching dynamic pad of `upstream` to a fixed sink pad.
///
/// Cloning is cheap; clones share the same slot.
#[derive(Clone)]
pub struct PadResolver {
    inner: Arc<ResolverInner>,
}

impl std::fmt::Debug for PadResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PadResolver")
            .field("upstream", &self.inner.upstream)
            .field("sink", &self.inner.sink_desc)
            .field("matcher", &self.inner.matcher)
            .field("linked", &self.inner.slot.is_linked())
            .finish()
    }
}

impl PadResolver {
    /// Create a resolver for pads of `upstream`, linking into `sink_pad`.
    pub fn new(upstream: impl Into<String>, sink_pad: gst::Pad, matcher: PadMatcher) -> Self {
        let sink_desc = match sink_pad.parent_element() {
            Some(parent) => format!("{}:{}", parent.name(), sink_pad.name()),
            None => sink_pad.name().to_string(),
        };
        Self {
            inner: Arc::new(ResolverInner {
                upstream: upstream.into(),
                sink_pad,
                sink_desc,
                matcher,
                slot: LinkSlot::new(),
            }),
        }
    }

    /// Connect this resolver to the element's `pad-added` signal.
    pub fn attach(&self, element: &gst::Element) -> gst::glib::SignalHandlerId {
        debug!(
            "Attaching pad resolver to {} ({} -> {})",
            element.name(),
            self.inner.matcher,
            self.inner.sink_desc
        );
        let resolver = self.clone();
        element.connect_pad_added(move |_element, new_pad| {
            resolver.on_pad_added(new_pad);
        })
    }

    /// Whether the sink slot has been filled.
    pub fn is_linked(&self) -> bool {
        self.inner.slot.is_linked()
    }

    pub fn upstream(&self) -> &str {
        &self.inner.upstream
    }

    /// Handle one newly created pad.
    pub fn on_pad_added(&self, new_pad: &gst::Pad) -> Resolution {
        let inner = &self.inner;
        let pad_name = new_pad.name();

        if new_pad.direction() != gst::PadDirection::Src {
            debug!(
                "Ignoring non-source pad '{}' from '{}'",
                pad_name, inner.upstream
            );
            return Resolution::NotSource;
        }

        info!("Received new pad '{}' from '{}'", pad_name, inner.upstream);

        if inner.slot.is_linked() || inner.sink_pad.is_linked() {
            info!("{} is already linked. Ignoring.", inner.sink_desc);
            return Resolution::AlreadyLinked;
        }

        let media_type = Self::media_type(new_pad, &inner.matcher);
        let type_desc = media_type.as_deref().unwrap_or("<no caps>");

        if !inner.matcher.matches(&pad_name, media_type.as_deref()) {
            info!(
                "Pad '{}' has type '{}', which does not match {}. Ignoring.",
                pad_name, type_desc, inner.matcher
            );
            return Resolution::Ignored;
        }

        if !inner.slot.try_claim() {
            info!("{} is already linked. Ignoring.", inner.sink_desc);
            return Resolution::AlreadyLinked;
        }

        match new_pad.link(&inner.sink_pad) {
            Ok(_) => {
                info!(
                    "Link succeeded: {}:{} -> {} (type '{}')",
                    inner.upstream, pad_name, inner.sink_desc, type_desc
                );
                Resolution::Linked
            }
            Err(e) => {
                inner.slot.release();
                error!(
                    "Type is '{}' but link {}:{} -> {} failed: {:?}",
                    type_desc, inner.upstream, pad_name, inner.sink_desc, e
                );
                Resolution::LinkFailed
            }
        }
    }

    /// Name of the first caps structure on the pad, if the matcher needs it.
    ///
    /// Prefers the negotiated caps and falls back to a caps query.
    fn media_type(pad: &gst::Pad, matcher: &PadMatcher) -> Option<String> {
        let caps = match pad.current_caps() {
            Some(caps) => caps,
            None if matcher.needs_caps() => pad.query_caps(None),
            None => return None,
        };
        caps.structure(0).map(|s| s.name().to_string())
    }
}
