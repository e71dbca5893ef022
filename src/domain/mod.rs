// Domain layer - Dashboard records, widgets and editing state
pub mod confirmation;
pub mod dashboard;
pub mod layout;
pub mod widget;
