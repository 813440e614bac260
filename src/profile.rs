//! Global message numbers and field name resolution.
//!
//! The decoder only names message kinds. Field names belong to the FIT
//! profile, which callers supply through [`FieldNames`].

use alloc::{collections::BTreeMap, string::String};

/// Global message numbers.
pub mod mesg_num {
    pub const FILE_ID: u16 = 0;
    pub const CAPABILITIES: u16 = 1;
    pub const DEVICE_SETTINGS: u16 = 2;
    pub const USER_PROFILE: u16 = 3;
    pub const HRM_PROFILE: u16 = 4;
    pub const SDM_PROFILE: u16 = 5;
    pub const BIKE_PROFILE: u16 = 6;
    pub const ZONES_TARGET: u16 = 7;
    pub const HR_ZONE: u16 = 8;
    pub const POWER_ZONE: u16 = 9;
    pub const MET_ZONE: u16 = 10;
    pub const SPORT: u16 = 12;
    pub const GOAL: u16 = 15;
    pub const SESSION: u16 = 18;
    pub const LAP: u16 = 19;
    pub const RECORD: u16 = 20;
    pub const EVENT: u16 = 21;
    pub const DEVICE_INFO: u16 = 23;
    pub const WORKOUT: u16 = 26;
    pub const WORKOUT_STEP: u16 = 27;
    pub const SCHEDULE: u16 = 28;
    pub const WEIGHT_SCALE: u16 = 30;
    pub const COURSE: u16 = 31;
    pub const COURSE_POINT: u16 = 32;
    pub const TOTALS: u16 = 33;
    pub const ACTIVITY: u16 = 34;
    pub const SOFTWARE: u16 = 35;
    pub const FILE_CAPABILITIES: u16 = 37;
    pub const MESG_CAPABILITIES: u16 = 38;
    pub const FIELD_CAPABILITIES: u16 = 39;
    pub const FILE_CREATOR: u16 = 49;
    pub const BLOOD_PRESSURE: u16 = 51;
    pub const SPEED_ZONE: u16 = 53;
    pub const MONITORING: u16 = 55;
    pub const TRAINING_FILE: u16 = 72;
    pub const HRV: u16 = 78;
    pub const ANT_RX: u16 = 80;
    pub const ANT_TX: u16 = 81;
    pub const ANT_CHANNEL_ID: u16 = 82;
    pub const LENGTH: u16 = 101;
    pub const MONITORING_INFO: u16 = 103;
    pub const PAD: u16 = 105;
    pub const SLAVE_DEVICE: u16 = 106;
    pub const CONNECTIVITY: u16 = 127;
    pub const WEATHER_CONDITIONS: u16 = 128;
    pub const WEATHER_ALERT: u16 = 129;
    pub const CADENCE_ZONE: u16 = 131;
    pub const HR: u16 = 132;
    pub const SEGMENT_LAP: u16 = 142;
    pub const MEMO_GLOB: u16 = 145;
    pub const SEGMENT_ID: u16 = 148;
    pub const SEGMENT_LEADERBOARD_ENTRY: u16 = 149;
    pub const SEGMENT_POINT: u16 = 150;
    pub const SEGMENT_FILE: u16 = 151;
    pub const WORKOUT_SESSION: u16 = 158;
    pub const WATCHFACE_SETTINGS: u16 = 159;
    pub const GPS_METADATA: u16 = 160;
    pub const CAMERA_EVENT: u16 = 161;
    pub const TIMESTAMP_CORRELATION: u16 = 162;
    pub const GYROSCOPE_DATA: u16 = 164;
    pub const ACCELEROMETER_DATA: u16 = 165;
    pub const THREE_D_SENSOR_CALIBRATION: u16 = 167;
    pub const VIDEO_FRAME: u16 = 169;
    pub const OBDII_DATA: u16 = 174;
    pub const NMEA_SENTENCE: u16 = 177;
    pub const AVIATION_ATTITUDE: u16 = 178;
    pub const VIDEO: u16 = 184;
    pub const VIDEO_TITLE: u16 = 185;
    pub const VIDEO_DESCRIPTION: u16 = 186;
    pub const VIDEO_CLIP: u16 = 187;
    pub const OHR_SETTINGS: u16 = 188;
    pub const EXD_SCREEN_CONFIGURATION: u16 = 200;
    pub const EXD_DATA_FIELD_CONFIGURATION: u16 = 201;
    pub const EXD_DATA_CONCEPT_CONFIGURATION: u16 = 202;
    pub const FIELD_DESCRIPTION: u16 = 206;
    pub const DEVELOPER_DATA_ID: u16 = 207;
    pub const MAGNETOMETER_DATA: u16 = 208;
    pub const BAROMETER_DATA: u16 = 209;
    pub const ONE_D_SENSOR_CALIBRATION: u16 = 210;
    pub const SET: u16 = 225;
    pub const STRESS_LEVEL: u16 = 227;
    pub const DIVE_SETTINGS: u16 = 258;
    pub const DIVE_GAS: u16 = 259;
    pub const DIVE_ALARM: u16 = 262;
    pub const EXERCISE_TITLE: u16 = 264;
    pub const DIVE_SUMMARY: u16 = 268;
    pub const JUMP: u16 = 285;
    pub const CLIMB_PRO: u16 = 317;
}

/// The profile name of a global message number.
pub fn message_name(global_message: u16) -> Option<&'static str> {
    use mesg_num::*;

    Some(match global_message {
        FILE_ID => "file_id",
        CAPABILITIES => "capabilities",
        DEVICE_SETTINGS => "device_settings",
        USER_PROFILE => "user_profile",
        HRM_PROFILE => "hrm_profile",
        SDM_PROFILE => "sdm_profile",
        BIKE_PROFILE => "bike_profile",
        ZONES_TARGET => "zones_target",
        HR_ZONE => "hr_zone",
        POWER_ZONE => "power_zone",
        MET_ZONE => "met_zone",
        SPORT => "sport",
        GOAL => "goal",
        SESSION => "session",
        LAP => "lap",
        RECORD => "record",
        EVENT => "event",
        DEVICE_INFO => "device_info",
        WORKOUT => "workout",
        WORKOUT_STEP => "workout_step",
        SCHEDULE => "schedule",
        WEIGHT_SCALE => "weight_scale",
        COURSE => "course",
        COURSE_POINT => "course_point",
        TOTALS => "totals",
        ACTIVITY => "activity",
        SOFTWARE => "software",
        FILE_CAPABILITIES => "file_capabilities",
        MESG_CAPABILITIES => "mesg_capabilities",
        FIELD_CAPABILITIES => "field_capabilities",
        FILE_CREATOR => "file_creator",
        BLOOD_PRESSURE => "blood_pressure",
        SPEED_ZONE => "speed_zone",
        MONITORING => "monitoring",
        TRAINING_FILE => "training_file",
        HRV => "hrv",
        ANT_RX => "ant_rx",
        ANT_TX => "ant_tx",
        ANT_CHANNEL_ID => "ant_channel_id",
        LENGTH => "length",
        MONITORING_INFO => "monitoring_info",
        PAD => "pad",
        SLAVE_DEVICE => "slave_device",
        CONNECTIVITY => "connectivity",
        WEATHER_CONDITIONS => "weather_conditions",
        WEATHER_ALERT => "weather_alert",
        CADENCE_ZONE => "cadence_zone",
        HR => "hr",
        SEGMENT_LAP => "segment_lap",
        MEMO_GLOB => "memo_glob",
        SEGMENT_ID => "segment_id",
        SEGMENT_LEADERBOARD_ENTRY => "segment_leaderboard_entry",
        SEGMENT_POINT => "segment_point",
        SEGMENT_FILE => "segment_file",
        WORKOUT_SESSION => "workout_session",
        WATCHFACE_SETTINGS => "watchface_settings",
        GPS_METADATA => "gps_metadata",
        CAMERA_EVENT => "camera_event",
        TIMESTAMP_CORRELATION => "timestamp_correlation",
        GYROSCOPE_DATA => "gyroscope_data",
        ACCELEROMETER_DATA => "accelerometer_data",
        THREE_D_SENSOR_CALIBRATION => "three_d_sensor_calibration",
        VIDEO_FRAME => "video_frame",
        OBDII_DATA => "obdii_data",
        NMEA_SENTENCE => "nmea_sentence",
        AVIATION_ATTITUDE => "aviation_attitude",
        VIDEO => "video",
        VIDEO_TITLE => "video_title",
        VIDEO_DESCRIPTION => "video_description",
        VIDEO_CLIP => "video_clip",
        OHR_SETTINGS => "ohr_settings",
        EXD_SCREEN_CONFIGURATION => "exd_screen_configuration",
        EXD_DATA_FIELD_CONFIGURATION => "exd_data_field_configuration",
        EXD_DATA_CONCEPT_CONFIGURATION => "exd_data_concept_configuration",
        FIELD_DESCRIPTION => "field_description",
        DEVELOPER_DATA_ID => "developer_data_id",
        MAGNETOMETER_DATA => "magnetometer_data",
        BAROMETER_DATA => "barometer_data",
        ONE_D_SENSOR_CALIBRATION => "one_d_sensor_calibration",
        SET => "set",
        STRESS_LEVEL => "stress_level",
        DIVE_SETTINGS => "dive_settings",
        DIVE_GAS => "dive_gas",
        DIVE_ALARM => "dive_alarm",
        EXERCISE_TITLE => "exercise_title",
        DIVE_SUMMARY => "dive_summary",
        JUMP => "jump",
        CLIMB_PRO => "climb_pro",
        _ => return None,
    })
}

/// The global message number of a profile message name.
pub fn message_number(name: &str) -> Option<u16> {
    // Every global message number in the profile is below 320.
    (0..320).find(|&n| message_name(n) == Some(name))
}

/// Resolve field numbers of a message kind to names.
pub trait FieldNames {
    fn name_for(&self, global_message: u16, field: u8) -> Option<&str>;
}

impl FieldNames for BTreeMap<(u16, u8), String> {
    fn name_for(&self, global_message: u16, field: u8) -> Option<&str> {
        self.get(&(global_message, field)).map(String::as_str)
    }
}

impl FieldNames for BTreeMap<(u16, u8), &str> {
    fn name_for(&self, global_message: u16, field: u8) -> Option<&str> {
        self.get(&(global_message, field)).copied()
    }
}

/// Field names from a function, such as a lookup into generated profile
/// tables.
#[derive(Debug, Clone, Copy)]
pub struct NameFn<F>(pub F);

impl<F> FieldNames for NameFn<F>
where
    F: Fn(u16, u8) -> Option<&'static str>,
{
    fn name_for(&self, global_message: u16, field: u8) -> Option<&str> {
        (self.0)(global_message, field)
    }
}
