mod push_cycle;
mod support;
