pub mod analysis;
pub mod cv;
pub mod github;
pub mod linkedin;

use std::sync::Arc;

/// The external evidence processors, one per source. All of them live
/// behind traits so the orchestrator never knows it is talking to HTTP.
#[derive(Clone)]
pub struct Processors {
    pub cv: Arc<dyn cv::CvProcessor>,
    pub github: Arc<dyn github::GithubProcessor>,
    pub linkedin: Arc<dyn linkedin::LinkedInJobs>,
    pub analyzer: Arc<dyn analysis::Analyzer>,
}
