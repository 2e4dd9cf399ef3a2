use thiserror::Error;

/// Startup-time configuration problems. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{var} no está configurada. Crea un archivo .env en el directorio raíz y agrega: {var}=tu_clave")]
    MissingKey { var: &'static str },

    #[error("{var} contiene un valor de ejemplo ({value:?}). Reemplázalo por tu clave real en .env")]
    PlaceholderKey { var: &'static str, value: String },

    #[error("{var} tiene un valor inválido: {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Listing or detail page could not be fetched.
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("no se pudo crear el cliente HTTP: {0}")]
    Client(#[source] reqwest::Error),

    #[error("falló la petición a {url}: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} respondió HTTP {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error("URL inválida {url}: {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

/// The model call failed or its answer could not be turned into a record.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("falló la petición de extracción: {0}")]
    Http(#[from] reqwest::Error),

    #[error("la clave de API contiene caracteres no permitidos en un encabezado")]
    InvalidApiKey,

    #[error("el servicio de extracción respondió HTTP {status}: {body}")]
    Api {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("la respuesta de extracción no trae bloque de texto")]
    EmptyResponse,

    #[error("la respuesta de extracción no es JSON válido: {0}")]
    InvalidJson(#[source] serde_json::Error),

    #[error("la respuesta de extracción es JSON pero no un objeto")]
    NotAnObject,
}

#[derive(Debug, Error)]
pub enum GeocodingError {
    #[error("falló la petición de geocodificación: {0}")]
    Http(#[from] reqwest::Error),

    #[error("el servicio de geocodificación respondió {status}: {message}")]
    Api { status: String, message: String },

    #[error("la respuesta de geocodificación no trae coordenadas")]
    InvalidResponse,
}

#[derive(Debug, Error)]
pub enum CsvError {
    #[error("no se pudo abrir {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("error de CSV en {path}: {source}")]
    Csv {
        path: String,
        #[source]
        source: csv::Error,
    },

    #[error("{path}: la fila {row} tiene {found} campos, el encabezado tiene {expected}")]
    Ragged {
        path: String,
        row: usize,
        expected: usize,
        found: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn messages_are_in_spanish() {
        let ragged = CsvError::Ragged {
            path: "museos.csv".into(),
            row: 3,
            expected: 11,
            found: 9,
        };
        assert_eq!(
            ragged.to_string(),
            "museos.csv: la fila 3 tiene 9 campos, el encabezado tiene 11"
        );
        assert_eq!(
            GeocodingError::InvalidResponse.to_string(),
            "la respuesta de geocodificación no trae coordenadas"
        );
    }
}
