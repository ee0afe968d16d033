pub mod menu_response;
