mod alertmanager;

pub use alertmanager::AlertmanagerParser;
