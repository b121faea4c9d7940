//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements             | Connects to                  |
//! |--------------|------------------------|------------------------------|
//! | `json_store` | SettingsStore          | settings.json                |
//! |              | ControlStore           | control.json (atomic rename) |
//! |              | HistorySink            | JSON-lines history file      |
//! |              | RecipeBook             | recipes.json                 |
//! | `memory`     | all store ports        | in-process documents         |
//! | `prototype`  | TemperatureSource      | simulated probe walk         |
//! |              | Actuator, PhysicalInput| simulated relays and switch  |
//! | `gpio`       | Actuator               | embedded-hal output pins     |
//! |              | PhysicalInput          | embedded-hal input pin       |
//! | `display`    | DisplaySink            | nothing / the logger         |
//! | `log_sink`   | EventSink              | structured log lines         |
//! |              | NotificationSink       | the logger                   |
//! | `time`       | Clock                  | system clock / simulation    |
//! | `registry`   | hardware + sink bundles| name → backend constructors  |

pub mod display;
pub mod gpio;
pub mod json_store;
pub mod log_sink;
pub mod memory;
pub mod prototype;
pub mod registry;
pub mod time;
