pub(crate) mod builder;
pub(crate) mod directive;
pub(crate) mod player;
pub(crate) mod schedule;
