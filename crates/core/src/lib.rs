//! Frame acquisition, landmark detection and annotation loop.
//!
//! Each bounded context keeps its ports in `domain` and the adapters that
//! talk to ffmpeg, ONNX Runtime, yt-dlp or the window system in
//! `infrastructure`. [`playback::playback_loop::PlaybackLoop`] wires them
//! together.

pub mod shared {
    pub mod constants;
    pub mod detection;
    pub mod frame;
    pub mod video_metadata;
}

pub mod video {
    pub mod domain {
        pub mod image_writer;
        pub mod source_reference;
        pub mod stream_source;
        pub mod url_resolver;
    }
    pub mod infrastructure;
}

pub mod detection {
    pub mod domain {
        pub mod detector;
        pub mod detector_config;
        pub mod face_keypoints;
        pub mod hand_landmarks;
    }
    pub mod infrastructure;
}

pub mod annotation {
    pub mod domain {
        pub mod annotator;
        pub mod drawing_spec;
    }
    pub mod infrastructure;
}

pub mod display {
    pub mod domain {
        pub mod display_surface;
    }
    pub mod infrastructure;
}

pub mod playback {
    pub mod pipeline_logger;
    pub mod playback_config;
    pub mod playback_loop;
    pub mod playback_state;
}
