//! Sequence conversion.

use tracing::debug;

use crate::context::ConversionContext;
use crate::ddl;
use crate::schema;

/// Maps a source sequence kind onto the target's only kind.
#[must_use]
pub fn convert_sequence_kind(kind: schema::SequenceKind) -> ddl::SequenceKind {
    match kind {
        schema::SequenceKind::AutoIncrement | schema::SequenceKind::BitReversedPositive => {
            ddl::SequenceKind::BitReversedPositive
        }
    }
}

/// Converts `sequence` and stores it in the context under its id,
/// replacing any sequence already stored there.
///
/// Range bounds and the start counter are copied as opaque strings.
pub fn apply_sequence(ctx: &mut ConversionContext, sequence: &schema::Sequence) {
    let converted = ddl::Sequence {
        name: sequence.name.clone(),
        id: sequence.id.clone(),
        kind: convert_sequence_kind(sequence.kind),
        skip_range_min: sequence.skip_range_min.clone(),
        skip_range_max: sequence.skip_range_max.clone(),
        start_with_counter: sequence.start_with_counter.clone(),
    };
    debug!(sequence = %converted.name, kind = %converted.kind, "Converted sequence");
    ctx.target_sequences.insert(converted.id.clone(), converted);
}
