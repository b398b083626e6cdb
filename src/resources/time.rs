//! `checkpoint_management_time`: a time object used in rule bases.

use super::{common_object_fields, ApiObject};
use crate::schema::{Attribute, Block, NestedBlock, Schema};

/// Time objects.
pub struct Time;

fn moment() -> Block {
    Block::new()
        .with_attribute(
            "date",
            Attribute::optional_string().with_description("Date in format dd-MMM-yyyy."),
        )
        .with_attribute(
            "iso_8601",
            Attribute::optional_string().with_wire_name("iso-8601"),
        )
        .with_attribute(
            "posix",
            Attribute::optional_int64().with_description("Milliseconds since the epoch."),
        )
        .with_attribute(
            "time",
            Attribute::optional_string().with_description("Time in format HH:mm."),
        )
}

impl ApiObject for Time {
    fn object(&self) -> &'static str {
        "time"
    }

    fn type_name(&self) -> &'static str {
        "checkpoint_management_time"
    }

    fn data_source_name(&self) -> &'static str {
        "checkpoint_management_data_time"
    }

    fn schema(&self) -> Schema {
        let hours_range = Block::new()
            .with_attribute("enabled", Attribute::optional_bool())
            .with_attribute("from", Attribute::optional_string())
            .with_attribute("to", Attribute::optional_string())
            .with_attribute("index", Attribute::optional_int64());

        let recurrence = Block::new()
            .with_attribute(
                "pattern",
                Attribute::optional_string().with_description("Daily, Weekly, Monthly or None."),
            )
            .with_attribute("days", Attribute::string_set())
            .with_attribute("month", Attribute::optional_string())
            .with_attribute("weekdays", Attribute::string_set());

        let schema = Schema::v0()
            .with_id()
            .with_attribute("name", Attribute::required_string())
            .with_attribute(
                "start_now",
                Attribute::optional_bool().with_description("Start immediately."),
            )
            .with_attribute(
                "end_never",
                Attribute::optional_bool().with_description("Time never ends."),
            )
            .with_attribute("groups", Attribute::string_set())
            .with_block("start", NestedBlock::single(moment()))
            .with_block("end", NestedBlock::single(moment()))
            .with_block("hours_ranges", NestedBlock::list(hours_range).with_max_items(3))
            .with_block("recurrence", NestedBlock::single(recurrence));

        common_object_fields(schema)
    }
}
