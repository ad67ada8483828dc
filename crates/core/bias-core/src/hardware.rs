//! Hardware geometry descriptions
//!
//! A [`HardwareSpec`] describes one simplified set-associative cache or TLB:
//! how many sets it has, how large a line (or page) is, and the smallest array
//! worth simulating against it. Specs are built once at startup and never
//! change afterwards.

use serde::{Deserialize, Serialize};

use crate::error::{BiasError, BiasResult};

/// Immutable description of one cache or TLB geometry
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct HardwareSpec {
    description: String,
    number_of_sets: u32,
    block_size_in_bytes: u32,
    min_array_size_in_bytes: u32,
}

impl HardwareSpec {
    /// Start building a spec with the given human-readable description
    pub fn builder(description: impl Into<String>) -> HardwareSpecBuilder {
        HardwareSpecBuilder {
            description: description.into(),
            number_of_sets: 0,
            block_size_in_bytes: 0,
            min_array_size_in_bytes: 0,
        }
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn number_of_sets(&self) -> u32 {
        self.number_of_sets
    }

    pub fn block_size_in_bytes(&self) -> u32 {
        self.block_size_in_bytes
    }

    pub fn min_array_size_in_bytes(&self) -> u32 {
        self.min_array_size_in_bytes
    }

    /// Right shift turning an element index into a line/page id
    pub fn line_shift(&self, element_size_in_bytes: u32) -> BiasResult<u32> {
        if self.block_size_in_bytes < element_size_in_bytes {
            return Err(BiasError::BlockSmallerThanElement {
                description: self.description.clone(),
                block_size: self.block_size_in_bytes,
                element_size: element_size_in_bytes,
            });
        }
        Ok(self.block_size_in_bytes.ilog2() - element_size_in_bytes.ilog2())
    }

    /// The geometries the optimizer targets by default: common L1/L2 caches and
    /// L1 TLBs of x86, POWER7 and SPARC parts.
    pub fn default_catalog() -> Vec<HardwareSpec> {
        const KB: u32 = 1024;
        const MB: u32 = 1024 * 1024;
        let table: [(&str, u32, u32, u32); 7] = [
            ("TLB - 4k Pages, 4-way, 64 entries (e.g. x86 i7-4790K Level 1)", 16, 4 * KB, 512 * KB),
            ("TLB - 64k Pages, 4-way, 512 entries (e.g Power7)", 128, 64 * KB, 64 * MB),
            ("TLB - 2M Pages, 4-way, 32 entries (e.g. x86 i7-4790K Level 1)", 8, 2 * MB, 128 * MB),
            ("32k L1 Cache, 8-way, 64 byte cachelines (e.g. x86 i7-4790K)", 64, 64, 64 * KB),
            ("16k L1 Cache, 4-way, 32 byte cachelines (e.g. Sparc T5,M5,M6)", 128, 32, 32 * KB),
            ("32k L1 Cache, 8-way, 128 byte cachelines (e.g. Power7)", 32, 128, 64 * KB),
            ("256k L2 Cache, 8-way, 64 byte cachelines (e.g. x86 i7-4790K)", 512, 64, 512 * KB),
        ];
        table
            .into_iter()
            .map(|(description, sets, block, min_array)| HardwareSpec {
                description: description.to_string(),
                number_of_sets: sets,
                block_size_in_bytes: block,
                min_array_size_in_bytes: min_array,
            })
            .collect()
    }
}

/// Builder for [`HardwareSpec`]; every numeric field must be set
#[derive(Debug, Clone)]
pub struct HardwareSpecBuilder {
    description: String,
    number_of_sets: u32,
    block_size_in_bytes: u32,
    min_array_size_in_bytes: u32,
}

impl HardwareSpecBuilder {
    pub fn number_of_sets(mut self, number_of_sets: u32) -> Self {
        self.number_of_sets = number_of_sets;
        self
    }

    pub fn block_size_in_bytes(mut self, block_size_in_bytes: u32) -> Self {
        self.block_size_in_bytes = block_size_in_bytes;
        self
    }

    pub fn min_array_size_in_bytes(mut self, min_array_size_in_bytes: u32) -> Self {
        self.min_array_size_in_bytes = min_array_size_in_bytes;
        self
    }

    /// Validate and freeze the spec.
    ///
    /// Fails if any field is zero, or if the set count or block size is not a
    /// power of two (the set index is taken with a mask).
    pub fn build(self) -> BiasResult<HardwareSpec> {
        let missing = [
            ("number_of_sets", self.number_of_sets),
            ("block_size_in_bytes", self.block_size_in_bytes),
            ("min_array_size_in_bytes", self.min_array_size_in_bytes),
        ]
        .into_iter()
        .find(|(_, value)| *value == 0);
        if let Some((field, _)) = missing {
            return Err(BiasError::IncompleteHardwareSpec {
                description: self.description,
                field,
            });
        }

        for (field, value) in [
            ("number_of_sets", self.number_of_sets),
            ("block_size_in_bytes", self.block_size_in_bytes),
        ] {
            if !value.is_power_of_two() {
                return Err(BiasError::NotPowerOfTwo {
                    description: self.description,
                    field,
                    value,
                });
            }
        }

        Ok(HardwareSpec {
            description: self.description,
            number_of_sets: self.number_of_sets,
            block_size_in_bytes: self.block_size_in_bytes,
            min_array_size_in_bytes: self.min_array_size_in_bytes,
        })
    }
}

/// Serialized form of a hardware spec, as found in configuration files.
///
/// Missing fields deserialize as zero and are rejected by [`Self::build`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HardwareSpecConfig {
    pub description: String,
    #[serde(default)]
    pub number_of_sets: u32,
    #[serde(default)]
    pub block_size_in_bytes: u32,
    #[serde(default)]
    pub min_array_size_in_bytes: u32,
}

impl HardwareSpecConfig {
    pub fn build(&self) -> BiasResult<HardwareSpec> {
        HardwareSpec::builder(self.description.clone())
            .number_of_sets(self.number_of_sets)
            .block_size_in_bytes(self.block_size_in_bytes)
            .min_array_size_in_bytes(self.min_array_size_in_bytes)
            .build()
    }
}

impl From<&HardwareSpec> for HardwareSpecConfig {
    fn from(spec: &HardwareSpec) -> Self {
        Self {
            description: spec.description.clone(),
            number_of_sets: spec.number_of_sets,
            block_size_in_bytes: spec.block_size_in_bytes,
            min_array_size_in_bytes: spec.min_array_size_in_bytes,
        }
    }
}
