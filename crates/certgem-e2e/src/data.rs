//! Test data: login credentials and certificate form payloads.

use crate::result::{SuiteError, SuiteResult};
use serde::{Deserialize, Serialize};

/// Email used by the invalid-credentials scenarios
pub const INVALID_EMAIL: &str = "zelezin@gmail.com";

/// Password used by the invalid-credentials scenarios
pub const INVALID_PASSWORD: &str = "senhaincorreta123";

/// A login pair
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    /// Account email
    pub email: String,
    /// Account password
    pub password: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

impl Credentials {
    /// Create a credentials pair
    #[must_use]
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
        }
    }

    /// The valid account, from `CERTGEM_EMAIL` and `CERTGEM_PASSWORD`
    pub fn from_env() -> SuiteResult<Self> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    /// The valid account, read through `var`
    pub fn from_vars(var: impl Fn(&str) -> Option<String>) -> SuiteResult<Self> {
        let read = |key: &str| {
            var(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| SuiteError::config(format!("{key} is not set")))
        };
        Ok(Self::new(read("CERTGEM_EMAIL")?, read("CERTGEM_PASSWORD")?))
    }

    /// The known-bad pair the portal must reject
    #[must_use]
    pub fn invalid() -> Self {
        Self::new(INVALID_EMAIL, INVALID_PASSWORD)
    }
}

/// One certificate form payload; every field maps to the input with the
/// same id (`gem_name` to `#gemName`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateData {
    /// `#gemName`
    pub gem_name: String,
    /// `#item`
    pub item: String,
    /// `#color`
    pub color: String,
    /// `#transparency`
    pub transparency: String,
    /// `#clarity`
    pub clarity: String,
    /// `#shape`
    pub shape: String,
    /// `#weight`
    pub weight: String,
    /// `#measurements`
    pub measurements: String,
    /// `#species`
    pub species: String,
    /// `#variety`
    pub variety: String,
    /// `#treatment`
    pub treatment: String,
    /// `#origin`
    pub origin: String,
    /// `#comments`
    pub comments: String,
    /// `#observations`
    pub observations: String,
}

impl CertificateData {
    /// Form fields in declaration order, as `(input id, value)`
    #[must_use]
    pub fn fields(&self) -> [(&'static str, &str); 14] {
        [
            ("gemName", self.gem_name.as_str()),
            ("item", self.item.as_str()),
            ("color", self.color.as_str()),
            ("transparency", self.transparency.as_str()),
            ("clarity", self.clarity.as_str()),
            ("shape", self.shape.as_str()),
            ("weight", self.weight.as_str()),
            ("measurements", self.measurements.as_str()),
            ("species", self.species.as_str()),
            ("variety", self.variety.as_str()),
            ("treatment", self.treatment.as_str()),
            ("origin", self.origin.as_str()),
            ("comments", self.comments.as_str()),
            ("observations", self.observations.as_str()),
        ]
    }

    /// Default emerald fixture
    #[must_use]
    pub fn sample() -> Self {
        Self {
            gem_name: "Esmeralda Teste".into(),
            item: "Pedra Preciosa".into(),
            color: "Verde".into(),
            transparency: "Transparente".into(),
            clarity: "VS1".into(),
            shape: "Oval".into(),
            weight: "2.5".into(),
            measurements: "8x6x4".into(),
            species: "Berilo".into(),
            variety: "Esmeralda".into(),
            treatment: "Natural".into(),
            origin: "Brasil".into(),
            comments: "Certificado de teste automatizado".into(),
            observations: "Teste realizado pelo Playwright".into(),
        }
    }

    /// Ruby with every field at its richest
    #[must_use]
    pub fn premium() -> Self {
        Self {
            gem_name: "Rubi Premium".into(),
            item: "Gema Natural".into(),
            color: "Vermelho Intenso".into(),
            transparency: "Transparente".into(),
            clarity: "VVS1".into(),
            shape: "Redondo".into(),
            weight: "3.2".into(),
            measurements: "10x10x6".into(),
            species: "Coríndon".into(),
            variety: "Rubi".into(),
            treatment: "Aquecimento".into(),
            origin: "Myanmar".into(),
            comments: "Gema de qualidade excepcional".into(),
            observations: "Certificado criado via automação".into(),
        }
    }

    /// Shortest plausible values
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            gem_name: "Teste Mínimo".into(),
            item: "Item".into(),
            color: "Azul".into(),
            transparency: "Opaco".into(),
            clarity: "I1".into(),
            shape: "Cabochão".into(),
            weight: "1.0".into(),
            measurements: "5x5x3".into(),
            species: "Quartzo".into(),
            variety: "Ágata".into(),
            treatment: "Natural".into(),
            origin: "Brasil".into(),
            comments: "Teste".into(),
            observations: "Teste".into(),
        }
    }

    /// Quotes, ampersands, accents and punctuation in every field
    #[must_use]
    pub fn special_characters() -> Self {
        Self {
            gem_name: "Ametista \"Especial\" & Rara".into(),
            item: "Item com acentos: çãõáéí".into(),
            color: "Roxo-violeta (intenso)".into(),
            transparency: "Semi-transparente".into(),
            clarity: "VS2+".into(),
            shape: "Formato especial".into(),
            weight: "2,75".into(),
            measurements: "12.5x8.3x5.1".into(),
            species: "Quartzo & Família".into(),
            variety: "Ametista Premium".into(),
            treatment: "Natural (sem tratamento)".into(),
            origin: "Rio Grande do Sul - Brasil".into(),
            comments: "Comentários com \"aspas\" e símbolos: @#$%".into(),
            observations: "Observações especiais: ç, ã, é, í, ó, ú".into(),
        }
    }

    /// Every field empty
    #[must_use]
    pub fn invalid() -> Self {
        Self {
            gem_name: String::new(),
            item: String::new(),
            color: String::new(),
            transparency: String::new(),
            clarity: String::new(),
            shape: String::new(),
            weight: String::new(),
            measurements: String::new(),
            species: String::new(),
            variety: String::new(),
            treatment: String::new(),
            origin: String::new(),
            comments: String::new(),
            observations: String::new(),
        }
    }

    /// The `i`-th record of the multi-create flow, derived from [`sample`]
    ///
    /// [`sample`]: CertificateData::sample
    #[must_use]
    pub fn iteration(i: u32) -> Self {
        Self {
            gem_name: format!("Certificado Teste {i}"),
            weight: format!("{i}.{i}"),
            measurements: format!("{}x{}x{}", 5 + i, 5 + i, 3 + i),
            comments: format!("Certificado número {i} de teste automatizado"),
            observations: format!("Iteração {i} do teste de criação múltipla"),
            ..Self::sample()
        }
    }

    /// Sample data under a name unique to this run
    #[must_use]
    pub fn unique() -> Self {
        let now = chrono::Utc::now();
        Self {
            gem_name: format!("Certificado Único {}", now.timestamp_millis()),
            comments: format!("Criado em {}", now.to_rfc3339()),
            observations: "Teste de verificação pós-criação".into(),
            ..Self::sample()
        }
    }

    /// Whether every field is blank
    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.fields().iter().all(|(_, v)| v.trim().is_empty())
    }
}
