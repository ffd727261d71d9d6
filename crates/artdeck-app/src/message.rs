//! Message types of the console (TEA pattern)

use std::path::PathBuf;

use crate::input_key::InputKey;
use crate::product_view::ScanResult;

/// Section of the configuration page that has the focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfigFocus {
    /// Launch file, action, variant group and trial choosers
    #[default]
    Selectors,
    LaunchArgs,
    TrialValues,
}

/// Pane of the product view that has the focus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProductPane {
    #[default]
    Selectors,
    Types,
    Slots,
    Ranges,
    Cells,
}

/// All messages of the console
#[derive(Debug, Clone)]
pub enum Message {
    /// Keyboard event from the terminal
    Key(InputKey),

    /// Poll timer of the job monitors
    Tick,

    /// Quit, asking first when jobs are running
    RequestQuit,
    /// Quit immediately (signal or confirmed)
    Quit,
    ConfirmQuit,
    CancelQuit,

    // ─────────────────────────────────────────────────────────
    // Projects, tabs and feedback
    // ─────────────────────────────────────────────────────────
    SelectProject { project: String },
    NextProject,
    PrevProject,
    NextTab,
    PrevTab,
    SelectTab { index: usize },
    /// Close the selected tab (launch instance or product view)
    CloseTab,
    /// Run the retry message of the error card
    RetryError,
    DismissError,
    Notify { text: String },

    // ─────────────────────────────────────────────────────────
    // Configuration page
    // ─────────────────────────────────────────────────────────
    /// Re-read the configuration page of the selected project
    ReloadConfig,
    ConfigFocusNext,
    ConfigCursor { delta: isize },
    /// Next or previous choice of a selector, switch or select control
    ConfigCycle { forward: bool },
    StartEdit,
    EditInput { text: String },
    CommitEdit,
    CancelEdit,
    /// Prepare a launch instance from the current selection
    PrepareLaunch,
    /// Copy the variant of the selector under the cursor
    AddVariant,
    /// Ask to remove the variant of the selector under the cursor
    RemoveVariant,
    ConfirmRemoveVariant,
    CancelRemoveVariant,
    /// Edit the info text of the variant under the cursor
    StartInfoEdit,
    /// Open tabs for launch instances left on disk
    FindInstances,

    // ─────────────────────────────────────────────────────────
    // Launch tabs
    // ─────────────────────────────────────────────────────────
    LaunchJobs,
    TerminateSelected,
    TerminateAll,
    SelectJob { delta: isize },
    ScrollOutput { delta: isize },
    NextOutputType,
    OutputViewport { lines: usize },

    // ─────────────────────────────────────────────────────────
    // Product view
    // ─────────────────────────────────────────────────────────
    OpenProductView { rescan: bool },
    NextProductionGroup,
    ScanCompleted {
        project: String,
        variant_group: PathBuf,
        production_path: PathBuf,
        result: Result<ScanResult, String>,
    },
    /// The production definition of the watched variant group changed
    ProductionChanged,
    WatcherError { message: String },
    ProductPaneNext,
    ProductMove { delta: isize },
    ProductAdjust { forward: bool },
    ProductToggle,
    RangeWidth { delta: isize },
    /// Move the lower or upper endpoint of the focused range
    RangeEndpoint { upper: bool, delta: isize },
    /// Deferred reset of a corrected range window
    ResetRangePreview { project: String },
    /// Next choice of the n-th category of the selected cell
    CycleCategory { category: usize },
    /// Deferred rebuild of the product grid
    UpdateProductView { project: String },
}
