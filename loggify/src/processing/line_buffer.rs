use std::collections::VecDeque;

/// Reassembles arbitrary, possibly partial, text writes into complete lines.
///
/// Completed lines wait in a ready queue until the owner takes them with
/// `next_line`; a line that could not be delivered goes back to the front
/// with `requeue`, so nothing is dropped on a failed hand-off.
///
/// Invariant: `pending` never contains `'\n'`. Every newline-terminated
/// prefix moves to the ready queue as soon as it is seen.
#[derive(Debug, Default)]
pub struct LineBuffer {
    pending: String,
    ready: VecDeque<String>,
    completed: u64,
}

impl LineBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `data`, returning how many lines it completed.
    ///
    /// Only `'\n'` terminates a line; a preceding `'\r'` stays in the content.
    pub fn push(&mut self, data: &str) -> usize {
        self.pending.push_str(data);
        if !data.contains('\n') {
            return 0;
        }

        let mut count = 0;
        while let Some(pos) = self.pending.find('\n') {
            let mut line: String = self.pending.drain(..=pos).collect();
            line.pop();
            self.ready.push_back(line);
            count += 1;
        }
        count
    }

    /// Close the unterminated remainder as a line of its own.
    ///
    /// Returns false when there was nothing pending.
    pub fn finish_line(&mut self) -> bool {
        if self.pending.is_empty() {
            return false;
        }
        self.ready.push_back(std::mem::take(&mut self.pending));
        true
    }

    /// Take the oldest completed line, newline stripped.
    pub fn next_line(&mut self) -> Option<String> {
        let line = self.ready.pop_front()?;
        self.completed += 1;
        Some(line)
    }

    /// Put back a line taken by `next_line` that could not be delivered.
    pub fn requeue(&mut self, line: String) {
        self.completed = self.completed.saturating_sub(1);
        self.ready.push_front(line);
    }

    pub fn pending(&self) -> &str {
        &self.pending
    }

    /// Completed lines not yet taken.
    pub fn ready(&self) -> usize {
        self.ready.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty() && self.ready.is_empty()
    }

    /// Lines taken and not requeued.
    pub fn completed(&self) -> u64 {
        self.completed
    }
}
