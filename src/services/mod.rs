mod jobrecorder;

pub use jobrecorder::JobRecorder;
