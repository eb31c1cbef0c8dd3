//! Data models for menubot.

mod menu;
mod site;
mod task;

pub use menu::{DailyMenu, DailySummary, Dish, MenuDate, ParsedMenu};
pub use site::{ErrorResult, OcrResult, Restaurant, ScreenshotResult, SLACK_URL_PREFIX};
pub use task::{
    ImageFormat, OcrTaskInput, OcrTaskOutput, ScreenshotTaskInput, ScreenshotTaskOutput,
    SlackDownloadTaskInput, SlackDownloadTaskOutput, SlackUploadTaskInput, SlackUploadTaskOutput,
    SummaryTaskInput, SummaryTaskOutput,
};
