use thiserror::Error;

/// Tipo Result principal da biblioteca
pub type Result<T> = std::result::Result<T, ETLError>;

/// Erro principal do vendastar
#[derive(Error, Debug)]
pub enum ETLError {
    #[error("Erro de extração: {0}")]
    Extract(#[from] ExtractError),

    #[error("Erro de transformação: {0}")]
    Transform(#[from] TransformError),

    #[error("Erro de carga: {0}")]
    Load(#[from] LoadError),

    #[error("Erro de estatística: {0}")]
    Stats(#[from] StatsError),

    #[error("Erro de configuração: {0}")]
    Config(#[from] ConfigError),

    #[error("Erro de pipeline: {0}")]
    Pipeline(String),

    #[error("Erro de I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("Erro de serialização: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Erro genérico: {0}")]
    Generic(#[from] anyhow::Error),
}

/// Erros relacionados à extração de dados
#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("Arquivo não encontrado: {0}")]
    FileNotFound(String),

    #[error("Nenhum arquivo CSV encontrado em: {0}")]
    NoCsvFiles(String),

    #[error("Formato inválido: {0}")]
    InvalidFormat(String),

    #[error("Erro de parsing: {0}")]
    ParseError(String),
}

/// Erros relacionados à transformação de dados
#[derive(Error, Debug)]
pub enum TransformError {
    #[error("Coluna obrigatória ausente: {0}")]
    MissingColumn(String),

    #[error("Data inválida na coluna {column}: {value}")]
    InvalidDate { column: String, value: String },

    #[error("Valor monetário inválido na coluna {column}: {value}")]
    InvalidAmount { column: String, value: String },

    #[error("Erro de processamento: {0}")]
    ProcessingError(String),
}

/// Erros relacionados ao carregamento no esquema estrela
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Erro de conexão com o banco: {0}")]
    DestinationConnection(String),

    #[error("Erro de escrita: {0}")]
    WriteError(String),

    #[error("Erro ao aplicar o schema: {0}")]
    Migration(String),

    #[error("Falha ao resolver dimensão {dimension} para a chave {key}")]
    DimensionResolve { dimension: String, key: String },
}

/// Erros relacionados às estatísticas descritivas
#[derive(Error, Debug)]
pub enum StatsError {
    #[error("Sequência vazia: estatísticas exigem ao menos um valor")]
    EmptyInput,

    #[error("Percentil fora do intervalo [0, 100]: {0}")]
    InvalidPercentile(f64),

    #[error("Coluna numérica ausente ou sem valores válidos: {0}")]
    MissingNumericColumn(String),
}

/// Erros relacionados à configuração
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuração inválida: {0}")]
    InvalidConfig(String),

    #[error("Parâmetro obrigatório ausente: {0}")]
    MissingRequiredParameter(String),

    #[error("Valor inválido para {param}: {value}")]
    InvalidValue { param: String, value: String },

    #[error("Erro de parsing de configuração: {0}")]
    ParseError(String),
}

impl ETLError {
    /// Retorna o código de erro
    pub fn error_code(&self) -> &'static str {
        match self {
            ETLError::Extract(_) => "EXTRACT_ERROR",
            ETLError::Transform(_) => "TRANSFORM_ERROR",
            ETLError::Load(_) => "LOAD_ERROR",
            ETLError::Stats(_) => "STATS_ERROR",
            ETLError::Config(_) => "CONFIG_ERROR",
            ETLError::Pipeline(_) => "PIPELINE_ERROR",
            ETLError::Io(_) => "IO_ERROR",
            ETLError::Serialization(_) => "SERIALIZATION_ERROR",
            ETLError::Generic(_) => "GENERIC_ERROR",
        }
    }
}

impl From<config::ConfigError> for ETLError {
    fn from(err: config::ConfigError) -> Self {
        ETLError::Config(ConfigError::ParseError(err.to_string()))
    }
}

impl From<sqlx::Error> for ETLError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(db_err) => {
                ETLError::Load(LoadError::WriteError(db_err.to_string()))
            }
            sqlx::Error::Io(io_err) => ETLError::Io(io_err),
            sqlx::Error::PoolTimedOut => ETLError::Load(LoadError::DestinationConnection(
                "timeout ao obter conexão do pool".to_string(),
            )),
            _ => ETLError::Load(LoadError::DestinationConnection(err.to_string())),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for ETLError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        ETLError::Load(LoadError::Migration(err.to_string()))
    }
}

impl From<csv::Error> for ETLError {
    fn from(err: csv::Error) -> Self {
        match err.kind() {
            csv::ErrorKind::Io(io_err) => {
                ETLError::Io(std::io::Error::new(io_err.kind(), io_err.to_string()))
            }
            csv::ErrorKind::Utf8 { .. } => {
                ETLError::Extract(ExtractError::InvalidFormat("UTF-8 inválido".to_string()))
            }
            _ => ETLError::Extract(ExtractError::ParseError(err.to_string())),
        }
    }
}
