pub mod frame_path;
