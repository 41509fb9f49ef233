pub mod drive_result;
