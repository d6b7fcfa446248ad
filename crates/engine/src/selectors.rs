//! Structural selectors for the form framework under test

/// Any control a label can be attached to
pub const LABELLED_CONTROL: &str = "input, textarea, [role='combobox']";

/// Plain editable controls, preferred for typing
pub const PLAIN_INPUT: &str = "input, textarea";

pub const COMBOBOX: &str = "[role='combobox']";

/// Label-bearing elements inside a container, in lookup order
pub const LABELS: &[&str] = &[
    ".crt-input-label",
    "label",
    ".crt-checkbox-label",
    ".crt-base-input-width-holder-label",
    ".mat-form-field-label",
];

/// Labels carrying the framework's required marker
pub const REQUIRED_LABEL: &str =
    ".crt-input-label.required, label.required, .mat-form-field-required-marker";

pub const TEXT_CONTROL: &str = "input.mat-input-element, input[type='text'], input[matinput]";

pub const NUMBER_CONTROL: &str =
    "input[crtnumbercontrol], input[type='number'], input.mat-input-element";

pub const CHECKBOX_CONTROL: &str = "mat-checkbox input[type='checkbox']";

pub const DATETIME_CONTROL: &str =
    "input[aria-haspopup='dialog'], .crt-picker-input-control, .mat-datepicker-toggle, .mat-date-range-input";

pub const CHOICE_CONTROL: &str =
    ".crt-combobox-container, .crt-autocomplete-input-control, [role='combobox']";

/// Dedicated dropdown expander icon
pub const OVERLAY_EXPANDER: &str = "mat-icon[svgicon='caret-arrow']";

/// Trigger region used when there is no combobox role
pub const OVERLAY_TRIGGER: &str = ".crt-combobox-container, .crt-autocomplete-input-control, input";

pub const VISIBLE_PANEL: &str = ".cdk-overlay-pane .mat-autocomplete-panel.mat-autocomplete-visible";

pub const VISIBLE_OPTION: &str =
    ".cdk-overlay-pane .mat-autocomplete-panel.mat-autocomplete-visible .mat-option";

/// Text-bearing node nested in an option
pub const OPTION_LABEL: &str = ".chip-text, .mat-option-text";

pub const CHOICE_CLEAR: &str = ".combobox-expander.clear, mat-icon[svgicon='small-close']";

/// Chip showing the currently selected choice
pub const SELECTED_CHIP: &str = ".chip-text";

/// Validation messages in the subscript region below a control
pub const VALIDATION_MESSAGE: &str =
    ".mat-form-field-subscript-wrapper mat-error, .mat-form-field-subscript-wrapper [role='alert'], .crt-validation-message";

/// Field hosts discovered when indexing a page
pub const FIELD_HOSTS: &[&str] = &[
    "crt-input[element-name]",
    "crt-checkbox[element-name]",
    "crt-combobox[element-name]",
    "crt-number-input[element-name]",
    "crt-date-input[element-name]",
    "crt-time-input[element-name]",
    "crt-date-time-input[element-name]",
    "crt-datetimepicker[element-name]",
];

/// Attribute carrying a field's stable identifier
pub const FIELD_ID_ATTR: &str = "element-name";

pub const BODY: &str = "body";
