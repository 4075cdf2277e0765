pub mod ffmpeg;
pub mod pcm;
