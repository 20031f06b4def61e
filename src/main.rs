//src/main.rs

use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use controle_ligacoes::{
    config::{AppState, Settings},
    routes,
};

#[tokio::main]
async fn main() {
    // Inicializa o logger (RUST_LOG controla o nível)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env().expect("Falha ao ler a configuração.");
    let app_state = AppState::new(&settings)
        .await
        .expect("Falha ao inicializar o estado da aplicação.");

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(app_state.db.pool())
        .await
        .expect("Falha ao rodar as migrações do banco de dados.");

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Primeiro acesso: cria o supervisor se o banco estiver vazio
    if let (Some(email), Some(password)) = (&settings.supervisor_email, &settings.supervisor_password) {
        match app_state.user_service.ensure_supervisor("Supervisor", email, password).await {
            Ok(Some(user)) => tracing::info!("👑 Supervisor inicial criado: {}", user.email),
            Ok(None) => {}
            Err(e) => tracing::error!("🔥 Falha ao criar o supervisor inicial: {}", e),
        }
    }

    let app = routes::router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr)
        .await
        .expect("Falha ao iniciar o listener TCP");
    tracing::info!("🚀 Servidor escutando em {}", settings.bind_addr);
    axum::serve(listener, app).await.expect("Erro no servidor Axum");
}
