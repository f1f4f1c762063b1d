mod http_backend_client_test;
