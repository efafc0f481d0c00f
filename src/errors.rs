use fractic_server_error::{define_client_error, define_internal_error};

// IO-related.
define_client_error!(ReadError, "Error reading file.");

// Parsing-related.
define_client_error!(InvalidCsv, "Invalid CSV format.");
define_client_error!(InvalidCsvContent, "Invalid CSV content: {details}.", { details: &str });
define_client_error!(InvalidRon, "Invalid {ron_type} (invalid RON format).", { ron_type: &str });
define_client_error!(InvalidIsoDate, "Invalid ISO date: {date}.", { date: &str });
define_client_error!(
    InvalidIsoTimestamp,
    "Invalid ISO timestamp: {timestamp}.",
    { timestamp: &str }
);
define_client_error!(InvalidIsoCurrencyCode, "Invalid ISO currency code: {code}.", { code: &str });
define_client_error!(
    InvalidAccountingAmount,
    "Invalid accounting amount: '{value}'.",
    { value: &str }
);
define_client_error!(InvalidMonthCode, "Invalid month code: '{code}'.", { code: &str });
define_client_error!(
    InvalidQuarterSelector,
    "Invalid quarter selector: '{selector}'. Expected e.g. 'Q1-2024' or '2024-Q1'.",
    { selector: &str }
);

// Calculation-related.
define_client_error!(
    InvalidCalculationParameter,
    "Invalid calculation parameter: {details}.",
    { details: &str }
);
define_client_error!(
    ReportRowNotFound,
    "Report row '{row}' has no value at column {index} (row holds {len} columns). The computation is incomplete or has not run.",
    { row: &str, index: usize, len: usize }
);
define_client_error!(
    QuarterNotComputed,
    "No service charge records exist for {quarter}; run the job for it first.",
    { quarter: &str }
);
define_internal_error!(
    GenericCalculationFailure,
    "Calculation failed for '{context}': {details}.",
    { context: &str, details: &str }
);

// Loan-related.
define_client_error!(LoanNotFound, "Loan '{loan_id}' not found.", { loan_id: &str });
define_internal_error!(
    ChargeUpdateRejected,
    "Service charge update rejected for loan '{loan_id}'.",
    { loan_id: &str }
);
