// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use crate::{NO_FILE_SELECTED_MESSAGE, SelectedFile};

/// The candidate file and its local validity.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct UploadSession {
    file: Option<SelectedFile>,
    validation_error: Option<String>,
}

impl UploadSession {
    pub fn file(&self) -> Option<&SelectedFile> {
        self.file.as_ref()
    }

    pub fn validation_error(&self) -> Option<&str> {
        self.validation_error.as_deref()
    }

    /// Replaces the current file. The caller resets the outcome.
    pub fn select_file(&mut self, file: SelectedFile) {
        self.file = Some(file);
        self.validation_error = None;
    }

    pub fn validate_for_submit(&mut self) -> Result<&SelectedFile, &str> {
        match self.file.as_ref() {
            Some(file) => {
                self.validation_error = None;
                Ok(file)
            }
            None => Err(self
                .validation_error
                .insert(NO_FILE_SELECTED_MESSAGE.to_owned())
                .as_str()),
        }
    }
}
