use super::{PipelineError, PipelineManager};
use crate::gst::resolver::PadResolver;
use gstreamer as gst;
use gstreamer::prelude::*;
use pipewright_types::{DynamicLink, Link, PadRef};
use tracing::{debug, error, info};

impl PipelineManager {
    /// Link two stages according to a static link definition.
    pub(super) fn try_link_elements(&self, link: &Link) -> Result<(), PipelineError> {
        let (from_ref, to_ref) = link.to_pad_refs();
        debug!("Trying to link: {} -> {}", from_ref, to_ref);

        let result = self.try_link_pad_refs(&from_ref, &to_ref);
        match &result {
            Ok(()) => debug!("Successfully linked: {} -> {}", link.from, link.to),
            Err(e) => error!("{}", e),
        }
        result
    }

    fn try_link_pad_refs(&self, from_ref: &PadRef, to_ref: &PadRef) -> Result<(), PipelineError> {
        let link_error = |reason: String| PipelineError::LinkError {
            from: from_ref.to_string(),
            to: to_ref.to_string(),
            reason,
        };

        let src = self.get_element(&from_ref.stage_id)?;
        let sink = self.get_element(&to_ref.stage_id)?;

        match (from_ref.pad_name.as_deref(), to_ref.pad_name.as_deref()) {
            (None, None) => src
                .link(sink)
                .map_err(|e| link_error(e.to_string())),
            (Some(src_pad_name), Some(sink_pad_name)) => {
                let src_pad = Self::resolve_pad(src, src_pad_name, gst::PadDirection::Src)
                    .ok_or_else(|| {
                        link_error(format!("source pad {} not available", src_pad_name))
                    })?;
                let sink_pad = Self::resolve_pad(sink, sink_pad_name, gst::PadDirection::Sink)
                    .ok_or_else(|| {
                        link_error(format!("sink pad {} not available", sink_pad_name))
                    })?;
                src_pad
                    .link(&sink_pad)
                    .map(|_| ())
                    .map_err(|e| link_error(format!("{:?}", e)))
            }
            // One side named: let GStreamer pick or request the other pad
            (src_pad_name, sink_pad_name) => src
                .link_pads(src_pad_name, sink, sink_pad_name)
                .map_err(|e| link_error(e.to_string())),
        }
    }

    /// Find a pad by name: static pad first, then a request pad.
    ///
    /// Names such as "sink_0" are also matched against request templates
    /// like "sink_%u" when the element refuses the exact name.
    pub(super) fn resolve_pad(
        element: &gst::Element,
        pad_name: &str,
        direction: gst::PadDirection,
    ) -> Option<gst::Pad> {
        if let Some(pad) = element.static_pad(pad_name) {
            return Some(pad);
        }

        if let Some(pad) = element.request_pad_simple(pad_name) {
            debug!("Requested pad {}:{}", element.name(), pad.name());
            return Some(pad);
        }

        // Get templates from the element, not the factory
        let template = element
            .pad_template_list()
            .into_iter()
            .filter(|tmpl| {
                tmpl.presence() == gst::PadPresence::Request && tmpl.direction() == direction
            })
            .find(|tmpl| {
                let name_template = tmpl.name_template();
                if name_template.contains("%u") || name_template.contains("%d") {
                    let prefix = name_template.split('%').next().unwrap_or("");
                    pad_name.starts_with(prefix)
                } else {
                    name_template == pad_name
                }
            })?;

        debug!(
            "Found matching pad template '{}' for pad name '{}'",
            template.name_template(),
            pad_name
        );
        element.request_pad(&template, None, None)
    }

    /// Attach a pad resolver for a link whose source pad appears at runtime.
    pub(super) fn add_dynamic_link(&mut self, link: &DynamicLink) -> Result<(), PipelineError> {
        let sink_ref = link.sink_ref();
        let sink_pad_name = sink_ref.pad_name.as_deref().unwrap_or("sink");

        let upstream = self.get_element(&link.from)?.clone();
        let sink = self.get_element(&sink_ref.stage_id)?;

        let sink_pad = Self::resolve_pad(sink, sink_pad_name, gst::PadDirection::Sink)
            .ok_or_else(|| PipelineError::PadNotFound {
                element: sink_ref.stage_id.clone(),
                pad: sink_pad_name.to_string(),
            })?;

        info!(
            "Waiting for {} pad on {} to link into {}",
            link.matcher, link.from, sink_ref
        );

        let resolver = PadResolver::new(link.from.clone(), sink_pad, link.matcher.clone());
        resolver.attach(&upstream);
        self.resolvers.push(resolver);
        Ok(())
    }

    fn get_element(&self, id: &str) -> Result<&gst::Element, PipelineError> {
        self.elements
            .get(id)
            .ok_or_else(|| PipelineError::ElementNotFound(id.to_string()))
    }
}
