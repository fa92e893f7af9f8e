pub mod analysis_service;
pub mod dataset_service;
pub mod groq_service;
pub mod report_service;

pub use analysis_service::AnalysisService;
pub use dataset_service::DatasetService;
pub use groq_service::GroqService;
pub use report_service::ReportService;
