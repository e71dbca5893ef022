// Working copy of one dashboard's grid while it is being edited
use super::dashboard::CellRect;
use super::widget::WidgetKind;
use chrono::NaiveDate;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EditState {
    Uninitialized,
    Loaded,
    Dirty,
    Saved,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum LayoutError {
    #[error("layout has not been initialized")]
    Uninitialized,
}

/// The fields of a record owned by the layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFields {
    pub layout: Vec<CellRect>,
    pub date: NaiveDate,
}

/// Four 1x1 cells in a 2x2 arrangement, one per widget kind.
pub fn default_layout() -> Vec<CellRect> {
    vec![
        CellRect::new("1", 0, 0, 1, 1),
        CellRect::new("2", 1, 0, 1, 1),
        CellRect::new("3", 0, 1, 1, 1),
        CellRect::new("4", 1, 1, 1, 1),
    ]
}

#[derive(Debug, Clone)]
pub struct LayoutController {
    state: EditState,
    cells: Vec<CellRect>,
}

impl Default for LayoutController {
    fn default() -> Self {
        Self {
            state: EditState::Uninitialized,
            cells: Vec::new(),
        }
    }
}

impl LayoutController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds from a stored layout, or the default grid when there is none.
    pub fn initialize(&mut self, layout: Option<Vec<CellRect>>) {
        self.cells = layout.unwrap_or_else(default_layout);
        self.state = EditState::Loaded;
    }

    pub fn state(&self) -> EditState {
        self.state
    }

    pub fn cells(&self) -> &[CellRect] {
        &self.cells
    }

    /// Replaces the rectangles verbatim with what the layout engine reported.
    pub fn on_rectangles_changed(&mut self, rects: Vec<CellRect>) -> Result<(), LayoutError> {
        self.ensure_initialized()?;
        self.cells = rects;
        self.state = EditState::Dirty;
        Ok(())
    }

    /// Returns whether a cell was removed.
    pub fn remove_cell(&mut self, cell_id: &str) -> Result<bool, LayoutError> {
        self.ensure_initialized()?;
        let before = self.cells.len();
        self.cells.retain(|cell| cell.id != cell_id);
        let removed = self.cells.len() != before;
        if removed {
            self.state = EditState::Dirty;
        }
        Ok(removed)
    }

    pub fn to_record_fields(&self, today: NaiveDate) -> Result<RecordFields, LayoutError> {
        self.ensure_initialized()?;
        Ok(RecordFields {
            layout: self.cells.clone(),
            date: today,
        })
    }

    pub fn mark_saved(&mut self) -> Result<(), LayoutError> {
        self.ensure_initialized()?;
        self.state = EditState::Saved;
        Ok(())
    }

    /// Cells paired with the widget they render; `None` for ids outside the catalogue.
    pub fn widget_bindings(&self) -> Vec<(&CellRect, Option<WidgetKind>)> {
        self.cells()
            .iter()
            .map(|cell| (cell, WidgetKind::from_cell_id(&cell.id)))
            .collect()
    }

    fn ensure_initialized(&self) -> Result<(), LayoutError> {
        if self.state == EditState::Uninitialized {
            return Err(LayoutError::Uninitialized);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()
    }

    #[test]
    fn test_uninitialized_rejects_mutation() {
        let mut controller = LayoutController::new();
        assert_eq!(controller.remove_cell("1"), Err(LayoutError::Uninitialized));
        assert_eq!(
            controller.on_rectangles_changed(default_layout()),
            Err(LayoutError::Uninitialized)
        );
        assert!(controller.to_record_fields(today()).is_err());
    }

    #[test]
    fn test_default_grid() {
        let mut controller = LayoutController::new();
        controller.initialize(None);
        assert_eq!(controller.state(), EditState::Loaded);
        assert_eq!(controller.cells().len(), 4);
        let kinds: Vec<_> = controller.widget_bindings().into_iter().map(|(_, k)| k).collect();
        assert_eq!(kinds, WidgetKind::ALL.map(Some).to_vec());
    }

    #[test]
    fn test_remove_cell_keeps_bindings() {
        let mut controller = LayoutController::new();
        controller.initialize(None);
        assert_eq!(controller.remove_cell("3"), Ok(true));
        assert_eq!(controller.state(), EditState::Dirty);

        let fields = controller.to_record_fields(today()).unwrap();
        assert_eq!(fields.layout.len(), 3);
        assert!(fields.layout.iter().all(|cell| cell.id != "3"));
        let bindings = controller.widget_bindings();
        assert_eq!(bindings[2].1, Some(WidgetKind::Geo));
    }

    #[test]
    fn test_remove_unknown_cell_stays_clean() {
        let mut controller = LayoutController::new();
        controller.initialize(Some(vec![CellRect::new("2", 0, 0, 2, 1)]));
        assert_eq!(controller.remove_cell("9"), Ok(false));
        assert_eq!(controller.state(), EditState::Loaded);

        controller
            .on_rectangles_changed(vec![CellRect::new("9", 0, 0, 1, 1)])
            .unwrap();
        assert_eq!(controller.widget_bindings()[0].1, None);
    }

    #[test]
    fn test_rectangles_replaced_verbatim() {
        let mut controller = LayoutController::new();
        controller.initialize(None);
        controller.mark_saved().unwrap();

        let moved = vec![
            CellRect::new("4", 0, 0, 2, 1),
            CellRect::new("1", 0, 1, 1, 1),
        ];
        controller.on_rectangles_changed(moved.clone()).unwrap();
        assert_eq!(controller.state(), EditState::Dirty);
        assert_eq!(controller.cells(), moved.as_slice());

        controller.mark_saved().unwrap();
        controller.mark_saved().unwrap();
        assert_eq!(controller.state(), EditState::Saved);
    }
}
