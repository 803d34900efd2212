//! Per-service state shared by the emitters

use crate::type_mapper::TypeMapper;
use crate::usage::Usage;
use sdkgen_common::{
    Location, Member, Protocol, Result, ServiceDefinition, Shape, StructureShape, TimestampFormat,
};

/// Everything an emitter needs to know about the service being generated
pub(crate) struct ServiceContext<'a> {
    pub(crate) service: &'a ServiceDefinition,
    pub(crate) types: TypeMapper<'a>,
    pub(crate) usage: Usage,
}

impl<'a> ServiceContext<'a> {
    pub(crate) fn new(service: &'a ServiceDefinition, operations: &[String]) -> Result<Self> {
        Ok(Self {
            service,
            types: TypeMapper::new(service),
            usage: Usage::analyze(service, operations)?,
        })
    }

    pub(crate) fn protocol(&self) -> Protocol {
        self.service.metadata.protocol
    }

    /// Wire format of a timestamp value
    ///
    /// The member's `timestampFormat` wins over the shape's; otherwise headers
    /// use RFC 822, URI labels and query strings ISO 8601, and bodies the
    /// protocol default.
    pub(crate) fn timestamp_format(&self, shape_name: &str, member: Option<&Member>) -> TimestampFormat {
        if let Some(format) = member.and_then(|m| m.timestamp_format) {
            return format;
        }
        if let Some(Shape::Scalar(scalar)) = self.service.shape(shape_name) {
            if let Some(format) = scalar.timestamp_format {
                return format;
            }
        }

        match member.map(|m| m.location) {
            Some(Location::Header) | Some(Location::Headers) => TimestampFormat::Rfc822,
            Some(Location::Uri) | Some(Location::Querystring) => TimestampFormat::Iso8601,
            _ => self.protocol().body_timestamp_format(),
        }
    }

    /// Members of a structure that live in the message body
    pub(crate) fn body_members<'s>(&self, structure: &'s StructureShape) -> Vec<&'s Member> {
        structure.body_members().collect()
    }
}

/// `runtime::TimestampFormat::…` expression for a format
pub(crate) fn timestamp_expr(format: TimestampFormat) -> String {
    format!("runtime::TimestampFormat::{}", format.runtime_variant())
}
