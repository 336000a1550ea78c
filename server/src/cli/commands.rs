// server/src/cli/commands.rs

use std::path::PathBuf;

#[derive(Debug, Clone, clap::Subcommand)]
pub enum Commands {
    /// Account management
    #[clap(subcommand)]
    User(UserCommand),
    /// Consultations and their vital signs
    #[clap(subcommand)]
    Consult(ConsultCommand),
    /// Patient medical histories
    #[clap(subcommand)]
    History(HistoryCommand),
    /// Complaint category catalog
    #[clap(subcommand)]
    Category(CategoryCommand),
    /// Dashboard announcements
    #[clap(subcommand)]
    Publication(PublicationCommand),
    /// Device heart-rate readings
    #[clap(subcommand)]
    Reading(ReadingCommand),
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum UserCommand {
    /// Register an account
    Create {
        #[arg(long, help = "Institutional key (clave)")]
        key: String,
        #[arg(long, help = "Institutional email address")]
        email: String,
        #[arg(long, help = "Given names, uppercase")]
        first_names: String,
        #[arg(long, help = "Paternal surname, uppercase")]
        paternal_surname: String,
        #[arg(long, help = "Maternal surname, uppercase")]
        maternal_surname: Option<String>,
        #[arg(long, help = "Birth date as dd/mm/yyyy")]
        birth_date: Option<String>,
        #[arg(long, help = "M or F")]
        sex: Option<String>,
        #[arg(long, help = "paciente, medico or administrador; derived from the area when omitted")]
        role: Option<String>,
        #[arg(long, help = "Career or job title, exactly as cataloged")]
        area: String,
        #[arg(long, help = "Grant back-office staff access")]
        staff: bool,
        #[arg(long, help = "Defaults to the configured institutional password")]
        password: Option<String>,
    },
    /// Check a login and password
    Authenticate {
        #[arg(long, help = "Key or email")]
        login: String,
        #[arg(long)]
        password: String,
    },
    /// Change the caller's password
    ChangePassword {
        #[arg(long, help = "Current password")]
        current: String,
        #[arg(long, help = "New password")]
        new: String,
        #[arg(long, help = "New password again")]
        confirm: String,
    },
    /// Bulk-import users from a CSV file
    Import {
        #[arg(long, value_parser = clap::value_parser!(PathBuf), help = "CSV file with the institutional column set")]
        file: PathBuf,
    },
    /// Create the histories that qualifying patients are missing
    BackfillHistories,
    /// Show one account
    View {
        #[arg(long)]
        key: String,
    },
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum ConsultCommand {
    /// Record a consultation together with its vital signs
    Create {
        #[arg(long, help = "Patient key, or the \"KEY - NAME\" string a picker returns")]
        patient: String,
        #[arg(long, help = "Current complaint")]
        complaint: String,
        #[arg(long)]
        non_drug_treatment: Option<String>,
        #[arg(long)]
        prescribed_treatment: Option<String>,
        #[arg(long, help = "Complaint category id")]
        category: Option<u64>,
        #[arg(long, help = "Weight in kilograms")]
        weight: Option<String>,
        #[arg(long, help = "Height in meters")]
        height: Option<String>,
        #[arg(long, help = "Temperature in Celsius")]
        temperature: Option<String>,
        #[arg(long, help = "Heart rate in beats per minute")]
        heart_rate: Option<String>,
        #[arg(long, help = "Respiratory rate in breaths per minute")]
        respiratory_rate: Option<String>,
        #[arg(long, help = "Blood pressure as systolic/diastolic")]
        blood_pressure: Option<String>,
    },
    /// List the consultations visible to the caller
    List {
        #[arg(long, help = "Substring of the patient key or name")]
        patient_contains: Option<String>,
        #[arg(long, help = "Earliest date, dd/mm/yyyy")]
        from: Option<String>,
        #[arg(long, help = "Latest date, dd/mm/yyyy")]
        to: Option<String>,
        #[arg(long, help = "Doctors only: list every consultation in the system")]
        show_all: bool,
        #[arg(long, help = "Page number; junk or out-of-range values are clamped")]
        page: Option<String>,
    },
    /// Look up an active patient for the consultation form
    FindPatient {
        #[arg(long)]
        key: String,
    },
    /// Export every consultation to CSV
    Export {
        #[arg(long, value_parser = clap::value_parser!(PathBuf), help = "Output file; a timestamped name in the current directory when omitted")]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum HistoryCommand {
    /// List patient histories
    List {
        #[arg(long, help = "Substring of the patient key")]
        search: Option<String>,
        #[arg(long, help = "Page number; junk or out-of-range values are clamped")]
        page: Option<String>,
    },
    /// Show one patient's history
    View {
        #[arg(long, help = "Patient key")]
        patient: String,
    },
    /// Edit history fields; a blank value clears a text field
    Edit {
        #[arg(long, help = "Patient key")]
        patient: String,
        #[arg(long)]
        chronic_conditions: Option<String>,
        #[arg(long)]
        allergies: Option<String>,
        #[arg(long)]
        current_medication: Option<String>,
        #[arg(long, help = "true or false; only recordable for female patients")]
        pregnant: Option<bool>,
        #[arg(long, help = "true or false")]
        uses_drugs: Option<bool>,
        #[arg(long, help = "true or false")]
        smokes: Option<bool>,
        #[arg(long, help = "true or false")]
        drinks_alcohol: Option<bool>,
        #[arg(long, help = "true or false")]
        wears_glasses: Option<bool>,
        #[arg(long, help = "true or false")]
        sexually_active: Option<bool>,
        #[arg(long, help = "true or false")]
        uses_contraceptives: Option<bool>,
    },
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum CategoryCommand {
    /// List the complaint categories
    List,
    /// Remove a category; consultations keep the dangling id and render as
    /// uncategorized
    Remove {
        #[arg(long)]
        id: u64,
    },
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum PublicationCommand {
    /// Store an announcement
    Add {
        #[arg(long)]
        title: String,
        #[arg(long, help = "Path of an attached image")]
        image: Option<String>,
        #[arg(long, help = "Store without publishing")]
        draft: bool,
    },
    /// Show the published feed, newest first
    List {
        #[arg(long, help = "Feed size, default 10")]
        limit: Option<usize>,
    },
}

#[derive(Debug, Clone, clap::Subcommand)]
pub enum ReadingCommand {
    /// Record a device heart-rate reading
    Push {
        #[arg(long, help = "Device identifier")]
        device: String,
        #[arg(long, help = "Beats per minute")]
        bpm: u16,
    },
    /// Show the freshest reading for a device
    Latest {
        #[arg(long, help = "Device identifier")]
        device: String,
    },
}
