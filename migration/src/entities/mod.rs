pub mod adaptive_qrc;
pub mod scan_log;
pub mod visitor_record;

pub use adaptive_qrc::Entity as AdaptiveQrcEntity;
pub use scan_log::Entity as ScanLogEntity;
pub use visitor_record::Entity as VisitorRecordEntity;
