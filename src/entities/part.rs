//! Part configuration - what the user selected for one part

use serde::{Deserialize, Serialize};

/// Boolean process selections, in the order they are costed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessFlag {
    Machining,
    Turning,
    #[serde(rename = "3d_printing")]
    Printing3d,
    Forming,
    Threading,
    Welding,
}

impl ProcessFlag {
    /// All flags in declared order
    pub const ALL: [ProcessFlag; 6] = [
        ProcessFlag::Machining,
        ProcessFlag::Turning,
        ProcessFlag::Printing3d,
        ProcessFlag::Forming,
        ProcessFlag::Threading,
        ProcessFlag::Welding,
    ];

    /// Display name, also the catalog process name the flag resolves to
    pub fn display_name(&self) -> &'static str {
        match self {
            ProcessFlag::Machining => "Machining",
            ProcessFlag::Turning => "Turning",
            ProcessFlag::Printing3d => "3D Printing",
            ProcessFlag::Forming => "Forming",
            ProcessFlag::Threading => "Threading",
            ProcessFlag::Welding => "Welding",
        }
    }
}

impl std::fmt::Display for ProcessFlag {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Configuration of a single part
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PartConfig {
    /// Batch size, must be at least 1
    #[serde(default = "default_quantity")]
    pub quantity: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub material: Option<String>,

    /// Single-select cutting process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cutting: Option<String>,

    #[serde(default)]
    pub machining: bool,

    #[serde(default)]
    pub turning: bool,

    #[serde(default, rename = "3d_printing")]
    pub printing_3d: bool,

    #[serde(default)]
    pub forming: bool,

    #[serde(default)]
    pub threading: bool,

    #[serde(default)]
    pub welding: bool,

    /// Single-select finishing process
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub finishing: Option<String>,
}

fn default_quantity() -> u32 {
    1
}

impl Default for PartConfig {
    fn default() -> Self {
        Self {
            quantity: default_quantity(),
            material: None,
            cutting: None,
            machining: false,
            turning: false,
            printing_3d: false,
            forming: false,
            threading: false,
            welding: false,
            finishing: None,
        }
    }
}

impl PartConfig {
    pub fn has_flag(&self, flag: ProcessFlag) -> bool {
        match flag {
            ProcessFlag::Machining => self.machining,
            ProcessFlag::Turning => self.turning,
            ProcessFlag::Printing3d => self.printing_3d,
            ProcessFlag::Forming => self.forming,
            ProcessFlag::Threading => self.threading,
            ProcessFlag::Welding => self.welding,
        }
    }

    pub fn set_flag(&mut self, flag: ProcessFlag, on: bool) {
        match flag {
            ProcessFlag::Machining => self.machining = on,
            ProcessFlag::Turning => self.turning = on,
            ProcessFlag::Printing3d => self.printing_3d = on,
            ProcessFlag::Forming => self.forming = on,
            ProcessFlag::Threading => self.threading = on,
            ProcessFlag::Welding => self.welding = on,
        }
    }

    /// Builder-style flag setter
    pub fn with_flag(mut self, flag: ProcessFlag) -> Self {
        self.set_flag(flag, true);
        self
    }

    /// Selected process names in costing order: cutting, flags, finishing
    pub fn selected_processes(&self) -> Vec<&str> {
        let mut names = Vec::new();
        if let Some(ref cutting) = self.cutting {
            names.push(cutting.as_str());
        }
        for flag in ProcessFlag::ALL {
            if self.has_flag(flag) {
                names.push(flag.display_name());
            }
        }
        if let Some(ref finishing) = self.finishing {
            names.push(finishing.as_str());
        }
        names
    }
}
