use std::fmt;

/// Badge classes for a status the dashboard does not recognise.
pub const DEFAULT_CLASS: &str = "badge bg-gray-100 text-gray-800";

/// Workflow status of a letter, as reported by the API.
///
/// Transitions happen server-side; this type only classifies the string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Estado {
    Ingresado,
    Pendiente,
    PendienteArea,
    Cerrado,
    Otro(String),
}

impl Estado {
    /// All statuses the API is known to return, in workflow order.
    pub const CONOCIDOS: [Estado; 4] = [
        Estado::Ingresado,
        Estado::Pendiente,
        Estado::PendienteArea,
        Estado::Cerrado,
    ];

    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "Ingresado" => Self::Ingresado,
            "Pendiente" => Self::Pendiente,
            "PendienteArea" => Self::PendienteArea,
            "Cerrado" => Self::Cerrado,
            other => Self::Otro(other.to_string()),
        }
    }

    pub fn from_option(raw: Option<&str>) -> Option<Self> {
        raw.filter(|s| !s.trim().is_empty()).map(Self::parse)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Ingresado => "Ingresado",
            Self::Pendiente => "Pendiente",
            Self::PendienteArea => "PendienteArea",
            Self::Cerrado => "Cerrado",
            Self::Otro(s) => s,
        }
    }

    /// Human label shown in badges.
    pub fn label(&self) -> &str {
        match self {
            Self::PendienteArea => "Pendiente de área",
            other => other.as_str(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        match self {
            Self::Ingresado => "badge bg-blue-100 text-blue-800",
            Self::Pendiente => "badge bg-yellow-100 text-yellow-800",
            Self::PendienteArea => "badge bg-orange-100 text-orange-800",
            Self::Cerrado => "badge bg-green-100 text-green-800",
            Self::Otro(_) => DEFAULT_CLASS,
        }
    }

    pub fn is_closed(&self) -> bool {
        matches!(self, Self::Cerrado)
    }
}

impl fmt::Display for Estado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Label and classes for an optional status string.
pub fn badge(raw: Option<&str>) -> (String, &'static str) {
    match Estado::from_option(raw) {
        Some(estado) => (estado.label().to_string(), estado.css_class()),
        None => ("Sin estado".to_string(), DEFAULT_CLASS),
    }
}
