//! Input batching
//!
//! Each line of the input buffer is one message. A blank line closes the
//! current batch; runs of blank lines never produce empty batches.

/// Messages processed together
pub type Batch = Vec<String>;

/// Split raw input into batches of messages
pub fn parse_batches(input: &str) -> Vec<Batch> {
    let mut batches = vec![Batch::new()];

    for line in input.split('\n') {
        let line = line.strip_suffix('\r').unwrap_or(line);
        if line.is_empty() {
            if batches.last().is_some_and(|b| !b.is_empty()) {
                batches.push(Batch::new());
            }
            continue;
        }
        if let Some(current) = batches.last_mut() {
            current.push(line.to_string());
        }
    }

    batches.retain(|b| !b.is_empty());
    batches
}
