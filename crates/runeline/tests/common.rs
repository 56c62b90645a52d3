// Shared helpers for driving a full Readline over scripted input

#![allow(dead_code)]

use runeline::{Readline, ReadlineBuilder};
use runeline_core::MemoryOutput;
use runeline_io::MockConsoleInput;
use std::time::Duration;

/// A running instance plus handles on its scripted input and captured output
pub struct Session {
    pub rl: Readline,
    pub input: MockConsoleInput,
    pub output: MemoryOutput,
    pub errors: MemoryOutput,
}

impl Session {
    pub fn new() -> Self {
        Self::with(ReadlineBuilder::new())
    }

    /// Build `builder` over a mock 80x24 terminal
    pub fn with(builder: ReadlineBuilder) -> Self {
        let input = MockConsoleInput::new();
        let output = MemoryOutput::new();
        let errors = MemoryOutput::new();
        let rl = builder
            .with_input(input.clone())
            .with_output(output.clone())
            .with_error_output(errors.clone())
            .with_escape_timeout(Duration::from_millis(5))
            .build()
            .expect("failed to build readline");
        Session {
            rl,
            input,
            output,
            errors,
        }
    }

    pub fn type_str(&self, text: &str) -> &Self {
        self.input.push_str(text);
        self
    }

    /// Queue `text` after `delay`, from another thread
    pub fn type_later(&self, delay: Duration, text: &str) -> std::thread::JoinHandle<()> {
        let input = self.input.clone();
        let text = text.to_string();
        std::thread::spawn(move || {
            std::thread::sleep(delay);
            input.push_str(&text);
        })
    }
}
