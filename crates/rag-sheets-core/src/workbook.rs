//! Workbook type - the parsed document handed to the engine

use crate::date::DateSystem;
use crate::error::{Error, Result};
use crate::worksheet::Worksheet;
use crate::MAX_SHEET_NAME_LEN;

/// A workbook: an ordered list of worksheets plus document settings
#[derive(Debug, Clone)]
pub struct Workbook {
    worksheets: Vec<Worksheet>,
    settings: WorkbookSettings,
}

impl Workbook {
    /// Create a new workbook with one empty worksheet named "Sheet1"
    pub fn new() -> Self {
        Self {
            worksheets: vec![Worksheet::new("Sheet1")],
            settings: WorkbookSettings::default(),
        }
    }

    /// Create an empty workbook with no worksheets
    pub fn empty() -> Self {
        Self {
            worksheets: Vec::new(),
            settings: WorkbookSettings::default(),
        }
    }

    /// Get the number of worksheets
    pub fn sheet_count(&self) -> usize {
        self.worksheets.len()
    }

    /// Check if the workbook has no worksheets
    pub fn is_empty(&self) -> bool {
        self.worksheets.is_empty()
    }

    /// Get a worksheet by index
    pub fn worksheet(&self, index: usize) -> Option<&Worksheet> {
        self.worksheets.get(index)
    }

    /// Get a mutable worksheet by index
    pub fn worksheet_mut(&mut self, index: usize) -> Option<&mut Worksheet> {
        self.worksheets.get_mut(index)
    }

    /// Get a worksheet by name
    pub fn worksheet_by_name(&self, name: &str) -> Result<&Worksheet> {
        self.worksheets
            .iter()
            .find(|ws| ws.name() == name)
            .ok_or_else(|| Error::SheetNotFound(name.to_string()))
    }

    /// Iterate over all worksheets in tab order
    pub fn worksheets(&self) -> impl Iterator<Item = &Worksheet> {
        self.worksheets.iter()
    }

    /// Sheet names in tab order
    pub fn sheet_names(&self) -> Vec<&str> {
        self.worksheets.iter().map(|ws| ws.name()).collect()
    }

    /// Add a new empty worksheet, returning its index
    pub fn add_worksheet_with_name(&mut self, name: &str) -> Result<usize> {
        self.validate_sheet_name(name)?;
        self.worksheets.push(Worksheet::new(name));
        Ok(self.worksheets.len() - 1)
    }

    /// Add an already populated worksheet, returning its index
    pub fn add_existing_worksheet(&mut self, worksheet: Worksheet) -> Result<usize> {
        self.validate_sheet_name(worksheet.name())?;
        self.worksheets.push(worksheet);
        Ok(self.worksheets.len() - 1)
    }

    /// Rename a worksheet
    pub fn rename_worksheet(&mut self, index: usize, new_name: &str) -> Result<()> {
        let count = self.worksheets.len();
        if index >= count {
            return Err(Error::SheetOutOfBounds(index, count));
        }
        self.validate_sheet_name_excluding(new_name, Some(index))?;
        self.worksheets[index].set_name(new_name);
        Ok(())
    }

    /// Workbook settings
    pub fn settings(&self) -> &WorkbookSettings {
        &self.settings
    }

    /// Mutable workbook settings
    pub fn settings_mut(&mut self) -> &mut WorkbookSettings {
        &mut self.settings
    }

    fn validate_sheet_name(&self, name: &str) -> Result<()> {
        self.validate_sheet_name_excluding(name, None)
    }

    fn validate_sheet_name_excluding(
        &self,
        name: &str,
        exclude_index: Option<usize>,
    ) -> Result<()> {
        if name.is_empty() {
            return Err(Error::InvalidSheetName("Sheet name cannot be empty".into()));
        }
        if name.chars().count() > MAX_SHEET_NAME_LEN {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name too long (max {} characters)",
                MAX_SHEET_NAME_LEN
            )));
        }
        if let Some(c) = name.chars().find(|c| INVALID_SHEET_CHARS.contains(c)) {
            return Err(Error::InvalidSheetName(format!(
                "Sheet name cannot contain '{}'",
                c
            )));
        }

        let name_lower = name.to_lowercase();
        let duplicate = self
            .worksheets
            .iter()
            .enumerate()
            .any(|(i, ws)| Some(i) != exclude_index && ws.name().to_lowercase() == name_lower);
        if duplicate {
            return Err(Error::DuplicateSheetName(name.into()));
        }

        Ok(())
    }
}

/// Characters a sheet name may not contain
pub const INVALID_SHEET_CHARS: &[char] = &[':', '\\', '/', '?', '*', '[', ']'];

impl Default for Workbook {
    fn default() -> Self {
        Self::new()
    }
}

/// Workbook-level settings
#[derive(Debug, Clone, Default)]
pub struct WorkbookSettings {
    /// Epoch used by date serial numbers
    pub date_system: DateSystem,
}
