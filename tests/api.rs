mod common;

use std::path::Path;

use muebles_api::models::user::Rol;
use reqwest::{
    multipart::{Form, Part},
    StatusCode,
};
use serde_json::{json, Value};

use common::{levantar, token};

fn solicitud_mesa() -> Value {
    json!({
        "categoria": "mesa",
        "material": "pino",
        "acabado": "natural",
        "dimensiones": { "ancho": 100.0, "alto": 75.0, "profundidad": 60.0 },
        "unidades": 1
    })
}

#[tokio::test]
async fn catalogo_publico() {
    let srv = levantar().await;
    let http = reqwest::Client::new();

    let productos: Vec<Value> = http
        .get(format!("{}/api/productos", srv.base))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(productos.len(), 5);

    let r = http.get(format!("{}/api/productos/999", srv.base)).send().await.unwrap();
    assert_eq!(r.status(), StatusCode::NOT_FOUND);
    let cuerpo: Value = r.json().await.unwrap();
    assert_eq!(cuerpo["message"], "Producto no encontrado");
}

#[tokio::test]
async fn calcular_con_y_sin_sesion() {
    let srv = levantar().await;
    let http = reqwest::Client::new();
    let url = format!("{}/api/presupuestos/calcular", srv.base);

    let anonimo: Value = http.post(&url).json(&solicitud_mesa()).send().await.unwrap().json().await.unwrap();
    assert_eq!(anonimo["subtotal"], 1470.0);
    assert_eq!(anonimo["descuento"], 0.0);
    assert_eq!(anonimo["total"], 1470.0);

    let registrado: Value = http
        .post(&url)
        .bearer_auth(token(Rol::Client))
        .json(&solicitud_mesa())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(registrado["descuento"], 73.5);
    assert_eq!(registrado["total"], 1396.5);

    // un token caducado o ajeno se trata como visitante
    let ajeno: Value = http
        .post(&url)
        .bearer_auth("no-es-un-token")
        .json(&solicitud_mesa())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(ajeno["descuento"], 0.0);
}

#[tokio::test]
async fn calcular_rechaza_categoria_desconocida() {
    let srv = levantar().await;
    let mut body = solicitud_mesa();
    body["categoria"] = json!("trono");

    let r = reqwest::Client::new()
        .post(format!("{}/api/presupuestos/calcular", srv.base))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::BAD_REQUEST);
    let cuerpo: Value = r.json().await.unwrap();
    assert!(cuerpo["message"].as_str().unwrap().contains("trono"));
}

#[tokio::test]
async fn rutas_con_sesion_exigen_token() {
    let srv = levantar().await;
    let http = reqwest::Client::new();

    for ruta in ["/api/auth/validate", "/api/user/profile", "/api/client/projects"] {
        let r = http.get(format!("{}{}", srv.base, ruta)).send().await.unwrap();
        assert_eq!(r.status(), StatusCode::UNAUTHORIZED, "{}", ruta);
        let cuerpo: Value = r.json().await.unwrap();
        assert!(cuerpo["message"].is_string());
    }

    let r = http
        .get(format!("{}/api/auth/validate", srv.base))
        .bearer_auth("basura")
        .send()
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn rutas_de_admin_rechazan_clientes() {
    let srv = levantar().await;
    let http = reqwest::Client::new();

    for ruta in ["/api/presupuestos/listar", "/api/admin/proyectos", "/api/admin/planificacion"] {
        let r = http
            .get(format!("{}{}", srv.base, ruta))
            .bearer_auth(token(Rol::Client))
            .send()
            .await
            .unwrap();
        assert_eq!(r.status(), StatusCode::FORBIDDEN, "{}", ruta);
    }

    let r = http
        .put(format!("{}/api/presupuestos/actualizar-estado", srv.base))
        .bearer_auth(token(Rol::Usuario))
        .json(&json!({ "id": uuid::Uuid::new_v4(), "estado": "aceptado" }))
        .send()
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn listado_sin_base_de_datos_es_demo() {
    let srv = levantar().await;
    let cuerpo: Value = reqwest::Client::new()
        .get(format!("{}/api/presupuestos/listar", srv.base))
        .bearer_auth(token(Rol::Admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(cuerpo["origen"], "demo");
    assert_eq!(cuerpo["motivo"], "backend_no_disponible");
    assert_eq!(cuerpo["items"].as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn listado_demo_respeta_filtro_y_limite() {
    let srv = levantar().await;
    let http = reqwest::Client::new();

    let cuerpo: Value = http
        .get(format!("{}/api/presupuestos/listar?estado=pendiente", srv.base))
        .bearer_auth(token(Rol::Admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let items = cuerpo["items"].as_array().unwrap();
    assert!(!items.is_empty());
    assert!(items.iter().all(|p| p["estado"] == "pendiente"));

    let cuerpo: Value = http
        .get(format!("{}/api/presupuestos/listar?limite=2", srv.base))
        .bearer_auth(token(Rol::Admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(cuerpo["items"].as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn planificacion_demo_agrupa_y_cuenta_carga() {
    let srv = levantar().await;
    let cuerpo: Value = reqwest::Client::new()
        .get(format!("{}/api/admin/planificacion", srv.base))
        .bearer_auth(token(Rol::Admin))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(cuerpo["origen"], "demo");
    assert!(cuerpo["grupos"].is_object());
    assert!(cuerpo["carga"].is_array());
    assert!(cuerpo["sin_asignar"].is_array());
}

#[tokio::test]
async fn base_de_datos_caida_en_detalle_es_error_interno() {
    let srv = levantar().await;
    let r = reqwest::Client::new()
        .get(format!("{}/api/presupuestos/detalle?id={}", srv.base, uuid::Uuid::new_v4()))
        .bearer_auth(token(Rol::Client))
        .send()
        .await
        .unwrap();
    assert_eq!(r.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let cuerpo: Value = r.json().await.unwrap();
    // el detalle del error de sqlx no sale del servidor
    assert_eq!(cuerpo["message"], "Error interno");
}

/// Comprueba que la respuesta es un error JSON `{"message"}` y devuelve el mensaje.
async fn mensaje_de_error(r: reqwest::Response, esperado: StatusCode) -> String {
    assert_eq!(r.status(), esperado);
    let tipo = r
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    assert!(tipo.starts_with("application/json"), "content-type {tipo}");
    let cuerpo: Value = r.json().await.unwrap();
    cuerpo["message"].as_str().unwrap_or_default().to_string()
}

#[tokio::test]
async fn peticiones_mal_formadas_dan_400_en_json() {
    let srv = levantar().await;
    let http = reqwest::Client::new();

    // cuerpo que no es JSON válido
    let r = http
        .post(format!("{}/api/presupuestos/calcular", srv.base))
        .header(reqwest::header::CONTENT_TYPE, "application/json")
        .body("{\"categoria\": ")
        .send()
        .await
        .unwrap();
    assert!(!mensaje_de_error(r, StatusCode::BAD_REQUEST).await.is_empty());

    // id de producto no numérico
    let r = http.get(format!("{}/api/productos/abc", srv.base)).send().await.unwrap();
    assert!(!mensaje_de_error(r, StatusCode::BAD_REQUEST).await.is_empty());

    // estado desconocido en la query
    let r = http
        .get(format!("{}/api/presupuestos/listar?estado=inventado", srv.base))
        .bearer_auth(token(Rol::Admin))
        .send()
        .await
        .unwrap();
    assert!(!mensaje_de_error(r, StatusCode::BAD_REQUEST).await.is_empty());

    // porcentaje que no cabe en 0..=255
    let r = http
        .post(format!("{}/api/presupuestos/progreso", srv.base))
        .bearer_auth(token(Rol::Admin))
        .json(&json!({
            "presupuesto_id": uuid::Uuid::new_v4(),
            "porcentaje": 300,
            "etapa_actual": "Montaje"
        }))
        .send()
        .await
        .unwrap();
    assert!(!mensaje_de_error(r, StatusCode::BAD_REQUEST).await.is_empty());

    // porcentaje entre 101 y 255 lo rechaza el handler
    let r = http
        .post(format!("{}/api/presupuestos/progreso", srv.base))
        .bearer_auth(token(Rol::Admin))
        .json(&json!({
            "presupuesto_id": uuid::Uuid::new_v4(),
            "porcentaje": 150,
            "etapa_actual": "Montaje"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(
        mensaje_de_error(r, StatusCode::BAD_REQUEST).await,
        "El porcentaje debe estar entre 0 y 100"
    );

    let r = http.get(format!("{}/api/no-existe", srv.base)).send().await.unwrap();
    assert_eq!(mensaje_de_error(r, StatusCode::NOT_FOUND).await, "Ruta no encontrada");
}

fn datos_mesa() -> String {
    json!({
        "nombre": "Mesa de comedor",
        "categoria": "mesa",
        "material": "pino",
        "acabado": "natural",
        "dimensiones": { "ancho": 100.0, "alto": 75.0, "profundidad": 60.0 },
        "unidades": 1
    })
    .to_string()
}

fn png(nombre: &str) -> Part {
    Part::bytes(vec![0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a])
        .file_name(nombre.to_string())
        .mime_str("image/png")
        .unwrap()
}

fn archivos_en(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|d| d.count()).unwrap_or(0)
}

async fn crear_presupuesto(base: &str, form: Form) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/api/presupuestos/crear"))
        .bearer_auth(token(Rol::Client))
        .multipart(form)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn crear_rechaza_archivos_que_no_son_imagen() {
    let srv = levantar().await;
    let pdf = Part::bytes(b"%PDF-1.4".to_vec())
        .file_name("plano.pdf")
        .mime_str("application/pdf")
        .unwrap();
    let form = Form::new()
        .text("datos", datos_mesa())
        .part("imagen_0", png("boceto.png"))
        .part("imagen_1", pdf);

    let r = crear_presupuesto(&srv.base, form).await;
    assert_eq!(
        mensaje_de_error(r, StatusCode::BAD_REQUEST).await,
        "Solo se permiten imágenes (jpg, png, webp, gif)"
    );
    // la imagen que sí se guardó se borra
    assert_eq!(archivos_en(&srv.settings.upload_dir), 0);
}

#[tokio::test]
async fn crear_limita_el_numero_de_imagenes() {
    let srv = levantar().await;
    let mut form = Form::new().text("datos", datos_mesa());
    for i in 0..=srv.settings.max_imagenes {
        form = form.part(format!("imagen_{i}"), png(&format!("foto{i}.png")));
    }

    let r = crear_presupuesto(&srv.base, form).await;
    assert_eq!(
        mensaje_de_error(r, StatusCode::BAD_REQUEST).await,
        format!("Se admiten como máximo {} imágenes", srv.settings.max_imagenes)
    );
    assert_eq!(archivos_en(&srv.settings.upload_dir), 0);
}

#[tokio::test]
async fn crear_exige_datos_validos() {
    let srv = levantar().await;

    let r = crear_presupuesto(&srv.base, Form::new().part("imagen_0", png("foto.png"))).await;
    assert_eq!(mensaje_de_error(r, StatusCode::BAD_REQUEST).await, "No se envió el campo 'datos'");
    assert_eq!(archivos_en(&srv.settings.upload_dir), 0);

    let r = crear_presupuesto(&srv.base, Form::new().text("datos", "{ no es json")).await;
    assert!(mensaje_de_error(r, StatusCode::BAD_REQUEST)
        .await
        .starts_with("Campo 'datos' inválido"));

    // un cuerpo que no es multipart
    let r = reqwest::Client::new()
        .post(format!("{}/api/presupuestos/crear", srv.base))
        .bearer_auth(token(Rol::Client))
        .json(&json!({ "nombre": "Mesa" }))
        .send()
        .await
        .unwrap();
    assert!(!mensaje_de_error(r, StatusCode::BAD_REQUEST).await.is_empty());
}

#[tokio::test]
async fn crear_sin_base_de_datos_no_deja_imagenes() {
    let srv = levantar().await;
    let form = Form::new()
        .text("datos", datos_mesa())
        .part("imagen_0", png("a.png"))
        .part("imagen_1", png("b.png"));

    let r = crear_presupuesto(&srv.base, form).await;
    assert_eq!(mensaje_de_error(r, StatusCode::INTERNAL_SERVER_ERROR).await, "Error interno");
    assert_eq!(archivos_en(&srv.settings.upload_dir), 0);
}
