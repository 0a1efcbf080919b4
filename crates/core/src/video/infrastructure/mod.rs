pub mod ffmpeg_stream_source;
pub mod image_file_writer;
pub mod resolving_stream_source;
pub mod ytdlp_resolver;
