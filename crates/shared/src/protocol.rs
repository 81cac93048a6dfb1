use serde::{Deserialize, Serialize, Serializer};

/// Largest integer a JavaScript number represents exactly (2^53 - 1).
const MAX_SAFE_INTEGER: f64 = 9_007_199_254_740_991.0;

pub const DEFAULT_WAVELENGTH_NM: f64 = 630.0;
pub const DEFAULT_WAVELENGTH_STEP_NM: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControllerTask {
    WavelengthTuneStart,
    SaveNetworkDevices,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    PageUpdate,
    TaskRequest,
    BootFileError,
}

/// Page update sent once when the control channel opens.
///
/// Field order and names mirror what the controller's own web page emits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TuneCommand {
    pub task: Vec<ControllerTask>,
    #[serde(rename = "wavelength_2", serialize_with = "serialize_js_number")]
    pub wavelength_nm: f64,
    #[serde(rename = "wavelength_step_2", serialize_with = "serialize_js_number")]
    pub wavelength_step_nm: f64,
    pub message_type: MessageType,
}

impl TuneCommand {
    pub fn new(wavelength_nm: f64, wavelength_step_nm: f64) -> Self {
        Self {
            task: vec![ControllerTask::WavelengthTuneStart],
            wavelength_nm,
            wavelength_step_nm,
            message_type: MessageType::PageUpdate,
        }
    }

    pub fn to_frame(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

impl Default for TuneCommand {
    fn default() -> Self {
        Self::new(DEFAULT_WAVELENGTH_NM, DEFAULT_WAVELENGTH_STEP_NM)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageUpdate {
    pub remote_ip_address: String,
    pub message_type: MessageType,
}

impl PageUpdate {
    pub fn remote_ip(address: impl Into<String>) -> Self {
        Self {
            remote_ip_address: address.into(),
            message_type: MessageType::PageUpdate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRequest {
    pub message_type: MessageType,
    pub task: Vec<ControllerTask>,
}

impl TaskRequest {
    pub fn new(task: ControllerTask) -> Self {
        Self {
            message_type: MessageType::TaskRequest,
            task: vec![task],
        }
    }
}

/// Lenient view of an inbound frame. Only the tag is read; everything else is ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ControllerFrame {
    #[serde(default)]
    pub message_type: Option<String>,
}

impl ControllerFrame {
    pub fn is_boot_file_error(&self) -> bool {
        self.message_type.as_deref() == Some("boot_file_error")
    }
}

// Whole numbers go out as `630`, not `630.0`, matching JSON.stringify.
fn serialize_js_number<S: Serializer>(value: &f64, serializer: S) -> Result<S::Ok, S::Error> {
    if value.fract() == 0.0 && value.abs() <= MAX_SAFE_INTEGER {
        serializer.serialize_i64(*value as i64)
    } else {
        serializer.serialize_f64(*value)
    }
}

#[cfg(test)]
#[path = "tests/protocol_tests.rs"]
mod tests;
