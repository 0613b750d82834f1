//! Timeline markers: labelled, colored points on the replay timeline.
//!
//! Markers travel in the action stream (tag 8), but unlike the other
//! actions they carry a variable-length label and are therefore tables,
//! not fixed-layout structs.

use matchlog_codec::{Builder, DecodeError, Offset, TableMark};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::SchemaError;
use crate::object::{TableObject, add_optional_offset, encode_string, table_view};

table_view!(
    /// Borrowed reader for a timeline marker table.
    TimelineMarkerView
);

impl<'buf> TimelineMarkerView<'buf> {
    /// Slot of `round`.
    pub const ROUND: u16 = 0;
    /// Slot of `color_hex`.
    pub const COLOR_HEX: u16 = 1;
    /// Slot of `label`.
    pub const LABEL: u16 = 2;
    /// Number of slots.
    pub const FIELD_COUNT: u16 = 3;

    /// Round the marker points at. Defaults to 0.
    pub fn round(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::ROUND, 0)
    }

    /// Marker color as `0xRRGGBB`. Defaults to 0.
    pub fn color_hex(&self) -> Result<i32, DecodeError> {
        self.table.get(Self::COLOR_HEX, 0)
    }

    /// Marker label, if any.
    pub fn label(&self) -> Result<Option<&'buf str>, DecodeError> {
        self.table.get_str(Self::LABEL)
    }
}

/// A labelled point on the replay timeline.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct TimelineMarker {
    /// Round the marker points at.
    pub round: i32,
    /// Marker color as `0xRRGGBB`.
    pub color_hex: i32,
    /// Text shown next to the marker.
    pub label: Option<String>,
}

impl TableObject for TimelineMarker {
    type View<'buf> = TimelineMarkerView<'buf>;

    fn decode(view: TimelineMarkerView<'_>) -> Result<Self, DecodeError> {
        Ok(Self {
            round: view.round()?,
            color_hex: view.color_hex()?,
            label: view.label()?.map(str::to_owned),
        })
    }

    fn encode(&self, builder: &mut Builder) -> Result<Offset<TableMark>, SchemaError> {
        let label = encode_string(builder, self.label.as_deref())?;
        builder.start_table(TimelineMarkerView::FIELD_COUNT)?;
        builder.add_scalar(TimelineMarkerView::ROUND, self.round, 0)?;
        builder.add_scalar(TimelineMarkerView::COLOR_HEX, self.color_hex, 0)?;
        add_optional_offset(builder, TimelineMarkerView::LABEL, label)?;
        Ok(builder.end_table()?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use matchlog_codec::Follow;

    fn encode(marker: &TimelineMarker) -> Vec<u8> {
        let mut b = Builder::new();
        let root = marker.encode(&mut b).unwrap();
        b.finish(root).unwrap();
        b.into_finished().unwrap()
    }

    fn view(bytes: &[u8]) -> TimelineMarkerView<'_> {
        let loc = matchlog_codec::resolve_uoffset(bytes, 0).unwrap();
        TimelineMarkerView::follow(bytes, loc).unwrap()
    }

    #[test]
    fn all_absent() {
        let bytes = encode(&TimelineMarker::default());
        let v = view(&bytes);
        assert_eq!(v.table().slot_count(), 0);
        assert_eq!(v.round().ok(), Some(0));
        assert_eq!(v.color_hex().ok(), Some(0));
        assert_eq!(v.label().ok(), Some(None));
        assert_eq!(TimelineMarker::decode(v).unwrap(), TimelineMarker::default());
    }

    #[test]
    fn all_present() {
        let marker = TimelineMarker {
            round: 250,
            color_hex: 0x00FF_8800,
            label: Some("first tower".to_owned()),
        };
        let bytes = encode(&marker);
        assert_eq!(TimelineMarker::decode(view(&bytes)).unwrap(), marker);
    }

    #[test]
    fn empty_label_is_not_absent() {
        let marker = TimelineMarker {
            label: Some(String::new()),
            ..TimelineMarker::default()
        };
        let bytes = encode(&marker);
        assert_eq!(view(&bytes).label().ok(), Some(Some("")));
    }
}
