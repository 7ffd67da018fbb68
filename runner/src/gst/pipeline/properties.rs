use super::{PipelineError, PipelineManager};
use gstreamer as gst;
use gstreamer::glib;
use gstreamer::prelude::*;
use pipewright_types::PropertyValue;
use tracing::debug;

impl PipelineManager {
    /// Set a property on an element.
    ///
    /// Values are converted to the exact GLib type of the property and checked
    /// against its declared range, so a mismatch is reported as
    /// [`PipelineError::InvalidProperty`] instead of aborting inside GObject.
    pub(super) fn set_property(
        &self,
        element: &gst::Element,
        element_id: &str,
        prop_name: &str,
        prop_value: &PropertyValue,
    ) -> Result<(), PipelineError> {
        debug!(
            "Setting property: {}.{} = {}",
            element_id, prop_name, prop_value
        );

        let invalid = |reason: String| PipelineError::InvalidProperty {
            element: element_id.to_string(),
            property: prop_name.to_string(),
            reason,
        };

        let pspec = element
            .find_property(prop_name)
            .ok_or_else(|| invalid("no such property".to_string()))?;

        if !pspec.flags().contains(glib::ParamFlags::WRITABLE) {
            return Err(invalid("property is not writable".to_string()));
        }

        let value = convert_value(&pspec, prop_value).map_err(invalid)?;
        element.set_property_from_value(prop_name, &value);
        Ok(())
    }
}

/// Convert a property value into a `glib::Value` of the property's type.
pub(super) fn convert_value(
    pspec: &glib::ParamSpec,
    prop_value: &PropertyValue,
) -> Result<glib::Value, String> {
    let value_type = pspec.value_type();

    let out_of_range = |v: &dyn std::fmt::Display| {
        format!("Value {} doesn't fit in {}", v, value_type.name())
    };

    let value = match prop_value {
        PropertyValue::String(v) => {
            if value_type == glib::Type::STRING {
                v.to_value()
            } else {
                deserialize(v, pspec)?
            }
        }
        PropertyValue::Int(v) => match value_type {
            t if t == glib::Type::I32 => i32::try_from(*v)
                .map_err(|_| out_of_range(v))?
                .to_value(),
            t if t == glib::Type::U32 => u32::try_from(*v)
                .map_err(|_| out_of_range(v))?
                .to_value(),
            t if t == glib::Type::I64 => v.to_value(),
            t if t == glib::Type::U64 => u64::try_from(*v)
                .map_err(|_| out_of_range(v))?
                .to_value(),
            t if t == glib::Type::F64 => (*v as f64).to_value(),
            t if t == glib::Type::F32 => (*v as f32).to_value(),
            // Enums, flags and anything else GStreamer can parse from a number
            _ => deserialize(&v.to_string(), pspec)?,
        },
        PropertyValue::UInt(v) => match value_type {
            t if t == glib::Type::U32 => u32::try_from(*v)
                .map_err(|_| out_of_range(v))?
                .to_value(),
            t if t == glib::Type::U64 => v.to_value(),
            t if t == glib::Type::I32 => i32::try_from(*v)
                .map_err(|_| out_of_range(v))?
                .to_value(),
            t if t == glib::Type::I64 => i64::try_from(*v)
                .map_err(|_| out_of_range(v))?
                .to_value(),
            t if t == glib::Type::F64 => (*v as f64).to_value(),
            t if t == glib::Type::F32 => (*v as f32).to_value(),
            _ => deserialize(&v.to_string(), pspec)?,
        },
        PropertyValue::Float(v) => match value_type {
            t if t == glib::Type::F64 => v.to_value(),
            t if t == glib::Type::F32 => (*v as f32).to_value(),
            _ => {
                return Err(format!(
                    "Property expects {}, got floating point value {}",
                    value_type.name(),
                    v
                ))
            }
        },
        PropertyValue::Bool(v) => {
            if value_type == glib::Type::BOOL {
                v.to_value()
            } else {
                return Err(format!(
                    "Property expects {}, got boolean {}",
                    value_type.name(),
                    v
                ));
            }
        }
    };

    // The pspec's own bounds, e.g. num-buffers accepts nothing below -1
    let mut checked = value.clone();
    if pspec.value_validate(&mut checked) {
        return Err(format!(
            "Value {} is out of range for property '{}'",
            prop_value,
            pspec.name()
        ));
    }

    Ok(value)
}

fn deserialize(s: &str, pspec: &glib::ParamSpec) -> Result<glib::Value, String> {
    glib::Value::deserialize_with_pspec(s, pspec).map_err(|_| {
        format!(
            "'{}' can't be parsed as {}",
            s,
            pspec.value_type().name()
        )
    })
}
